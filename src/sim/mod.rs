mod attrition;
mod context;
mod refresh;
mod routes;
mod runner;
mod signal;
mod system;
mod upkeep;

pub use attrition::AttritionSystem;
pub use context::TickContext;
pub use refresh::RefreshSystem;
pub use routes::RouteSystem;
pub use runner::{TurnConfig, default_systems, dispatch_turn, run};
pub use signal::{Signal, SignalKind};
pub use system::{SimSystem, TurnPhase};
pub use upkeep::UpkeepSystem;
