//! Construction records: fresh-unit parameters and recursive save records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::item::{Inventory, ItemKey};
use super::permission::PermissionStore;
use super::route::AutomaticRoute;
use super::tile::Coordinates;
use super::unit::CharacterInfo;
use super::unit_type::{UnitClass, VehicleKind};
use crate::id::UnitId;

/// Parameters for creating a unit that has never existed before.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitInit {
    Worker {
        worker_type: String,
        location: Coordinates,
    },
    Officer {
        unit_type: String,
        location: Coordinates,
    },
    /// Merge an existing worker and officer; the officer's type decides the
    /// group type.
    Group { worker: UnitId, officer: UnitId },
    /// A vehicle, optionally crewed on creation by an existing worker.
    Vehicle {
        unit_type: String,
        location: Coordinates,
        crew: Option<UnitId>,
    },
}

/// Everything needed to rebuild one unit and, recursively, its sub-mobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSave {
    pub id: UnitId,
    pub unit_type: String,
    pub name: String,
    pub default_name: String,
    pub location: Coordinates,
    pub movement_points: f64,
    pub max_movement_points: f64,
    #[serde(default)]
    pub permissions: PermissionStore,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub equipment: BTreeSet<ItemKey>,
    #[serde(default)]
    pub automatic_route: AutomaticRoute,
    #[serde(default)]
    pub wait_until_full: bool,
    pub kind: KindSave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum KindSave {
    Worker {
        worker_type: String,
    },
    Officer {
        character: CharacterInfo,
    },
    Group {
        worker: Box<UnitSave>,
        officer: Box<UnitSave>,
    },
    Vehicle {
        #[serde(default)]
        vehicle_kind: Option<VehicleKind>,
        #[serde(default)]
        crew: Option<Box<UnitSave>>,
        #[serde(default)]
        passengers: Vec<UnitSave>,
        #[serde(default)]
        crew_replacing: bool,
    },
}

impl KindSave {
    pub fn class(&self) -> UnitClass {
        match self {
            KindSave::Worker { .. } => UnitClass::Worker,
            KindSave::Officer { .. } => UnitClass::Officer,
            KindSave::Group { .. } => UnitClass::Group,
            KindSave::Vehicle { .. } => UnitClass::Vehicle,
        }
    }
}

impl UnitSave {
    /// This record plus every nested sub-mob record.
    pub fn count_units(&self) -> usize {
        1 + match &self.kind {
            KindSave::Worker { .. } | KindSave::Officer { .. } => 0,
            KindSave::Group { worker, officer } => worker.count_units() + officer.count_units(),
            KindSave::Vehicle {
                crew, passengers, ..
            } => {
                crew.as_ref().map_or(0, |c| c.count_units())
                    + passengers.iter().map(UnitSave::count_units).sum::<usize>()
            }
        }
    }
}
