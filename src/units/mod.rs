//! Unit behaviour, written as `impl World` blocks so every operation sees
//! the registries it needs.

mod attrition;
mod factory;
mod group;
mod officer;
mod pmob;
mod route;
mod upkeep;
mod vehicle;
mod worker;

pub use attrition::{AttritionOutcome, attrition_chance};
pub use group::generate_group_movement_points;
pub use officer::generate_character;
