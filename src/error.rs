use thiserror::Error;

use crate::id::UnitId;
use crate::model::item::ItemKey;
use crate::model::tile::Coordinates;
use crate::model::unit_type::UnitClass;

/// A refused operation on units. Nothing has been mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    #[error("unit {id} is a {actual:?}, expected a {expected:?}")]
    WrongClass {
        id: UnitId,
        expected: UnitClass,
        actual: UnitClass,
    },
    #[error("unit {0} is inside a group or vehicle")]
    NotIndependent(UnitId),
    #[error("units {0} and {1} are not on the same tile")]
    NotColocated(UnitId, UnitId),
    #[error("vehicle {0} already has a crew")]
    AlreadyCrewed(UnitId),
    #[error("vehicle {0} has no crew")]
    NoCrew(UnitId),
    #[error("vehicle {0} still carries passengers")]
    HasPassengers(UnitId),
    #[error("vehicle {0} cannot board another vehicle")]
    CannotBoard(UnitId),
    #[error("unit {unit} is not aboard vehicle {vehicle}")]
    NotAboard { vehicle: UnitId, unit: UnitId },
    #[error("cannot preview a group without its {0}")]
    MissingMember(&'static str),
    #[error("unknown logistics incident kind: {0}")]
    InvalidIncidentKind(String),
    #[error("unknown unit type: {0}")]
    UnknownUnitType(String),
    #[error("unknown worker type: {0}")]
    UnknownWorkerType(String),
    #[error("unit type {key} is not a {expected:?} type")]
    TypeClassMismatch { key: String, expected: UnitClass },
    #[error("officer type {0} does not form groups")]
    NoGroupType(String),
    #[error("{to} is not adjacent to the route's last waypoint {from}")]
    RouteNotAdjacent { from: Coordinates, to: Coordinates },
    #[error("unit {id} cannot equip {item}")]
    CannotEquip { id: UnitId, item: ItemKey },
    #[error("no {item} available at {location}")]
    ItemUnavailable { item: ItemKey, location: Coordinates },
    #[error("unit {id} has no {item} equipped")]
    NotEquipped { id: UnitId, item: ItemKey },
    #[error("unit id {0} is already in use")]
    DuplicateId(UnitId),
}

/// Why a unit may not move right now. Displayed to the player verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MovementRefusal {
    #[error("This unit is inside a group or vehicle and cannot move on its own.")]
    Attached,
    #[error("A vehicle cannot move without a crew.")]
    NoCrew,
    #[error("This vehicle's crew is being replaced and cannot move until next turn.")]
    CrewBeingReplaced,
    #[error("Units can only move to an adjacent tile.")]
    NotAdjacent,
    #[error("Trains can only move along railroads.")]
    NoRailroad,
    #[error("This unit does not have enough movement points left.")]
    OutOfMovement,
}
