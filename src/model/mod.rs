#[macro_use]
mod macros;

pub mod dummy;
pub mod effect;
pub mod item;
pub mod permission;
pub mod route;
pub mod save;
pub mod tile;
pub mod unit;
pub mod unit_type;
pub mod world;

pub use dummy::{Dummy, DummyKind};
pub use effect::{Effect, IncidentKind, LogisticsIncident, SoundCue};
pub use item::{Inventory, ItemKey, ItemType, UpkeepPenalty};
pub use permission::{Permission, PermissionStore, PermissionValue};
pub use route::{AutomaticRoute, RouteStep};
pub use save::{KindSave, UnitInit, UnitSave};
pub use tile::{BuildingKind, Coordinates, Grid, Habitability, Tile};
pub use unit::{
    CharacterInfo, Container, GroupData, Movable, OfficerData, Pmob, UnitKind, UpkeepRecord,
    VehicleData, WorkerData,
};
pub use unit_type::{EquipmentType, ReplacementSource, UnitClass, UnitType, VehicleKind, WorkerType};
pub use world::{DeathCause, World};
