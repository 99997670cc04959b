use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::item::{Inventory, ItemKey, QUANTITY_EPSILON, UpkeepPenalty};
use super::permission::{Permission, PermissionStore};
use super::route::AutomaticRoute;
use super::tile::Coordinates;
use super::unit_type::{UnitClass, VehicleKind};
use crate::id::UnitId;

// ---------------------------------------------------------------------------
// Kind payloads
// ---------------------------------------------------------------------------

/// Identity generated once for an officer and kept across saves and
/// attrition replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub name: String,
    pub ethnicity: String,
    pub masculine: bool,
    pub voice_set: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerData {
    pub worker_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerData {
    pub character: CharacterInfo,
}

/// A group owns exactly one worker and one officer for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    pub worker: UnitId,
    pub officer: UnitId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleData {
    pub vehicle_kind: Option<VehicleKind>,
    pub crew: Option<UnitId>,
    pub passengers: Vec<UnitId>,
    /// Units forced out by the last ejection, kept for `reembark`.
    #[serde(default)]
    pub ejected_crew: Option<UnitId>,
    #[serde(default)]
    pub ejected_passengers: Vec<UnitId>,
    /// Crew is being replaced after attrition; no movement until refresh.
    #[serde(default)]
    pub crew_replacing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum UnitKind {
    Worker(WorkerData),
    Officer(OfficerData),
    Group(GroupData),
    Vehicle(VehicleData),
}

macro_rules! unit_kind_accessors {
    ($( $variant:ident, $data_ty:ident, $as_ref:ident, $as_mut:ident; )*) => {
        $(
            pub fn $as_ref(&self) -> Option<&$data_ty> {
                match self {
                    UnitKind::$variant(d) => Some(d),
                    _ => None,
                }
            }

            pub fn $as_mut(&mut self) -> Option<&mut $data_ty> {
                match self {
                    UnitKind::$variant(d) => Some(d),
                    _ => None,
                }
            }
        )*
    };
}

impl UnitKind {
    pub fn class(&self) -> UnitClass {
        match self {
            UnitKind::Worker(_) => UnitClass::Worker,
            UnitKind::Officer(_) => UnitClass::Officer,
            UnitKind::Group(_) => UnitClass::Group,
            UnitKind::Vehicle(_) => UnitClass::Vehicle,
        }
    }

    unit_kind_accessors! {
        Worker, WorkerData, as_worker, as_worker_mut;
        Officer, OfficerData, as_officer, as_officer_mut;
        Group, GroupData, as_group, as_group_mut;
        Vehicle, VehicleData, as_vehicle, as_vehicle_mut;
    }
}

// ---------------------------------------------------------------------------
// Attachment back-references
// ---------------------------------------------------------------------------

/// Non-owning pointer from an attached unit to the unit holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Container {
    InGroup { group: UnitId },
    Crewing { vehicle: UnitId },
    Passenger { vehicle: UnitId },
}

impl Container {
    pub fn holder(&self) -> UnitId {
        match *self {
            Container::InGroup { group } => group,
            Container::Crewing { vehicle } | Container::Passenger { vehicle } => vehicle,
        }
    }
}

/// Per-turn upkeep outcome, written by the consume pass and read by the
/// penalty pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpkeepRecord {
    pub penalty: UpkeepPenalty,
    pub missing_item: Option<ItemKey>,
}

// ---------------------------------------------------------------------------
// Pmob
// ---------------------------------------------------------------------------

/// A player-controlled mobile unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmob {
    pub id: UnitId,
    pub name: String,
    pub default_name: String,
    pub unit_type: String,
    /// Attached units track their container's tile.
    pub location: Coordinates,
    pub movement_points: f64,
    pub max_movement_points: f64,
    pub permissions: PermissionStore,
    pub inventory: Inventory,
    pub inventory_capacity: f64,
    pub equipment: BTreeSet<ItemKey>,
    pub automatic_route: AutomaticRoute,
    pub wait_until_full: bool,
    pub upkeep: UpkeepRecord,
    pub container: Option<Container>,
    pub kind: UnitKind,
}

impl Pmob {
    pub fn get_permission(&self, key: Permission) -> bool {
        self.permissions.get_permission(key)
    }

    pub fn any_permissions(&self, keys: &[Permission]) -> bool {
        self.permissions.any_permissions(keys)
    }

    pub fn all_permissions(&self, keys: &[Permission]) -> bool {
        self.permissions.all_permissions(keys)
    }

    pub fn class(&self) -> UnitClass {
        self.kind.class()
    }

    /// Not inside a group and not aboard a vehicle.
    pub fn is_independent(&self) -> bool {
        self.container.is_none()
    }

    /// Turn-queue membership is derived, never stored.
    pub fn in_turn_queue(&self) -> bool {
        self.movement_points > 0.0
            && !self.get_permission(Permission::SentryMode)
            && self.is_independent()
    }

    /// Units this one manages: a group's worker and officer, a vehicle's crew
    /// then passengers. Empty for leaves.
    pub fn sub_mobs(&self) -> Vec<UnitId> {
        match &self.kind {
            UnitKind::Group(g) => vec![g.worker, g.officer],
            UnitKind::Vehicle(v) => v.crew.iter().chain(v.passengers.iter()).copied().collect(),
            UnitKind::Worker(_) | UnitKind::Officer(_) => Vec::new(),
        }
    }

    pub fn remaining_capacity(&self) -> f64 {
        (self.inventory_capacity - self.inventory.total()).max(0.0)
    }

    pub fn inventory_full(&self) -> bool {
        self.inventory_capacity > 0.0 && self.remaining_capacity() <= QUANTITY_EPSILON
    }
}

/// Movement and capability state shared by live units and preview dummies.
pub trait Movable {
    fn movement_points(&self) -> f64;
    fn max_movement_points(&self) -> f64;
    fn has_permission(&self, key: Permission) -> bool;

    /// Fraction of this turn's movement left, in `[0, 1]`.
    fn movement_ratio(&self) -> f64 {
        if self.max_movement_points() <= 0.0 {
            0.0
        } else {
            (self.movement_points() / self.max_movement_points()).clamp(0.0, 1.0)
        }
    }
}

impl Movable for Pmob {
    fn movement_points(&self) -> f64 {
        self.movement_points
    }

    fn max_movement_points(&self) -> f64 {
        self.max_movement_points
    }

    fn has_permission(&self, key: Permission) -> bool {
        self.permissions.get_permission(key)
    }
}
