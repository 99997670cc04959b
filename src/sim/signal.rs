use serde::{Deserialize, Serialize};

use crate::id::UnitId;
use crate::model::DeathCause;

/// A signal emitted by one system and consumed by others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Turn the signal was raised in.
    pub turn: u32,
    /// What happened.
    pub kind: SignalKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A unit left play this turn.
    UnitDied { unit_id: UnitId, cause: DeathCause },

    /// A vehicle's crew was replaced after attrition.
    CrewReplaced { vehicle_id: UnitId },

    /// A group's worker was replaced after attrition.
    WorkerReplaced { group_id: UnitId, worker_id: UnitId },

    /// A group's officer was replaced after attrition.
    OfficerReplaced { group_id: UnitId, officer_id: UnitId },

    /// A unit finished one or more automatic route steps.
    RouteAdvanced { unit_id: UnitId, steps: usize },
}
