pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod rules;
pub mod sim;
pub mod units;

#[cfg(test)]
mod testutil;

pub use error::{MovementRefusal, UnitError};
pub use id::{IdGenerator, UnitId};
pub use model::{Dummy, Effect, Permission, Pmob, UnitInit, UnitKind, UnitSave, World};
pub use rules::Rules;
