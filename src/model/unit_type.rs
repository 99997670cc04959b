use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::ItemKey;
use super::permission::{Permission, PermissionStore};
use super::tile::BuildingKind;

/// Which of the four concrete unit shapes a type produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Worker,
    Officer,
    Group,
    Vehicle,
}

impl UnitClass {
    /// The class flag every unit of this class carries.
    pub fn permission(self) -> Permission {
        match self {
            UnitClass::Worker => Permission::Worker,
            UnitClass::Officer => Permission::Officer,
            UnitClass::Group => Permission::Group,
            UnitClass::Vehicle => Permission::Vehicle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VehicleKind {
    Train,
    Ship,
    Wagon,
}

string_enum!(VehicleKind {
    Train => "train",
    Ship => "ship",
    Wagon => "wagon",
});

impl VehicleKind {
    /// Building that lets passengers disembark in good order.
    pub fn supporting_building(self) -> Option<BuildingKind> {
        match self {
            VehicleKind::Train => Some(BuildingKind::TrainStation),
            VehicleKind::Ship => Some(BuildingKind::Port),
            VehicleKind::Wagon => None,
        }
    }

    pub fn permission(self) -> Option<Permission> {
        match self {
            VehicleKind::Train => Some(Permission::Train),
            VehicleKind::Ship => Some(Permission::Ship),
            VehicleKind::Wagon => None,
        }
    }
}

/// Catalogue entry describing a kind of unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub key: String,
    pub name: String,
    pub class: UnitClass,
    pub max_movement_points: f64,
    /// Items consumed per turn.
    #[serde(default)]
    pub upkeep: BTreeMap<ItemKey, f64>,
    /// Cargo space when operational (vehicles only count it while crewed).
    #[serde(default)]
    pub inventory_capacity: f64,
    /// Capabilities granted to every unit of this type.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub vehicle_kind: Option<VehicleKind>,
    /// For officer types: the group type formed when merged with a worker.
    #[serde(default)]
    pub group_type: Option<String>,
}

impl UnitType {
    /// Starting permissions: the class flag plus the type's declared capabilities.
    pub fn initial_permissions(&self) -> PermissionStore {
        let mut store = PermissionStore::with(self.permissions.iter().copied());
        store.set_permission(self.class.permission(), Some(true), false);
        if let Some(p) = self.vehicle_kind.and_then(VehicleKind::permission) {
            store.set_permission(p, Some(true), false);
        }
        store
    }
}

/// Where replacements for a worker pool come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementSource {
    #[default]
    Hired,
    Volunteers,
}

/// Shared labor pool for one kind of worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerType {
    pub key: String,
    pub name: String,
    /// Unit type instantiated for workers of this pool.
    pub unit_type: String,
    /// Data-driven capabilities applied to each worker (e.g. `european_workers`).
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub replacement_source: ReplacementSource,
    /// Workers of this type currently in play.
    #[serde(default)]
    pub number: u32,
    /// Replacements recruited so far.
    #[serde(default)]
    pub recruited: u32,
}

/// An equippable item, the capabilities a unit needs to carry it, and the
/// capabilities it grants while equipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub key: ItemKey,
    #[serde(default)]
    pub requirements: Vec<Permission>,
    #[serde(default)]
    pub grants: Vec<Permission>,
}

impl EquipmentType {
    pub fn can_equip(&self, permissions: &PermissionStore) -> bool {
        permissions.all_permissions(&self.requirements)
    }
}
