//! Side effects produced by core operations.
//!
//! The core never talks to audio, notification, or display code directly.
//! Operations append `Effect`s to the world in the order they happen, and a
//! presentation layer drains them.

use serde::{Deserialize, Serialize};

use crate::id::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Death,
    Embark,
    Disembark,
    Crew,
    Uncrew,
    Promotion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Dismissible player-facing message.
    Notification { message: String },
    Sound { cue: SoundCue },
    /// Give UI selection to a unit.
    Select { unit_id: UnitId },
    /// The displayed unit changed (or its displayed state did); `None` clears.
    CalibrateDisplay { unit_id: Option<UnitId> },
    /// A permission that alters the unit's image changed.
    RefreshImage { unit_id: UnitId },
}

impl Effect {
    pub fn notification(message: impl Into<String>) -> Self {
        Effect::Notification {
            message: message.into(),
        }
    }

    pub fn effect_type_str(&self) -> &'static str {
        match self {
            Effect::Notification { .. } => "notification",
            Effect::Sound { .. } => "sound",
            Effect::Select { .. } => "select",
            Effect::CalibrateDisplay { .. } => "calibrate_display",
            Effect::RefreshImage { .. } => "refresh_image",
        }
    }
}

/// Category of a logistics incident. Closed: unknown strings are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IncidentKind {
    Death,
    Starvation,
    Dehydration,
    Morale,
    Attrition,
}

string_enum!(IncidentKind {
    Death => "death",
    Starvation => "starvation",
    Dehydration => "dehydration",
    Morale => "morale",
    Attrition => "attrition",
});

/// One line of the turn's logistics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsIncident {
    pub turn: u32,
    pub unit_id: UnitId,
    pub kind: IncidentKind,
    pub cause: String,
    pub explanation: String,
}

impl LogisticsIncident {
    pub fn explain(kind: IncidentKind, unit_name: &str, cause: &str) -> String {
        match kind {
            IncidentKind::Death => format!("{unit_name} died from {cause}."),
            IncidentKind::Starvation => {
                format!("{unit_name} is starving after going without {cause}.")
            }
            IncidentKind::Dehydration => {
                format!("{unit_name} is dehydrated after going without {cause}.")
            }
            IncidentKind::Morale => {
                format!("{unit_name} lost morale after going without {cause}.")
            }
            IncidentKind::Attrition => format!("{unit_name} suffered attrition: {cause}."),
        }
    }
}
