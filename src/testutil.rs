use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::id::UnitId;
use crate::model::*;
use crate::sim::{Signal, SignalKind, SimSystem, TickContext};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn seeded_rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

/// Coordinates on the colony surface grid.
pub fn surface(x: i32, y: i32) -> Coordinates {
    Coordinates::new(Grid::Surface, x, y)
}

/// A fresh European workers unit.
pub fn worker_at(world: &mut World, rng: &mut SmallRng, location: Coordinates) -> UnitId {
    world
        .create_unit(
            UnitInit::Worker {
                worker_type: "european_workers".to_string(),
                location,
            },
            rng,
        )
        .unwrap()
}

pub fn officer_at(
    world: &mut World,
    rng: &mut SmallRng,
    unit_type: &str,
    location: Coordinates,
) -> UnitId {
    world
        .create_unit(
            UnitInit::Officer {
                unit_type: unit_type.to_string(),
                location,
            },
            rng,
        )
        .unwrap()
}

/// A vehicle crewed by fresh workers. Returns `(vehicle, crew)`.
pub fn crewed_vehicle(
    world: &mut World,
    rng: &mut SmallRng,
    unit_type: &str,
    location: Coordinates,
) -> (UnitId, UnitId) {
    let crew = worker_at(world, rng, location);
    let vehicle = world
        .create_unit(
            UnitInit::Vehicle {
                unit_type: unit_type.to_string(),
                location,
                crew: Some(crew),
            },
            rng,
        )
        .unwrap();
    (vehicle, crew)
}

/// A group led by a fresh officer. Returns `(group, worker, officer)`.
pub fn group_at(
    world: &mut World,
    rng: &mut SmallRng,
    officer_type: &str,
    location: Coordinates,
) -> (UnitId, UnitId, UnitId) {
    let worker = worker_at(world, rng, location);
    let officer = officer_at(world, rng, officer_type, location);
    let group = world
        .create_unit(UnitInit::Group { worker, officer }, rng)
        .unwrap();
    (group, worker, officer)
}

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a single system tick for the given turn. Returns emitted signals.
pub fn tick_system(
    world: &mut World,
    system: &mut dyn SimSystem,
    turn: u32,
    seed: u64,
) -> Vec<Signal> {
    world.turn = turn;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        world,
        rng: &mut rng,
        signals: &mut signals,
        inbox: &[],
    };
    system.tick(&mut ctx);
    signals
}

/// Run a system's handle_signals with the given inbox. Returns newly emitted signals.
pub fn deliver_signals(
    world: &mut World,
    system: &mut dyn SimSystem,
    inbox: &[Signal],
    seed: u64,
) -> Vec<Signal> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        world,
        rng: &mut rng,
        signals: &mut signals,
        inbox,
    };
    system.handle_signals(&mut ctx);
    signals
}

/// Run a full tick + handle_signals cycle for a single system. Returns all signals.
pub fn full_tick(
    world: &mut World,
    system: &mut dyn SimSystem,
    turn: u32,
    seed: u64,
) -> Vec<Signal> {
    let tick_signals = tick_system(world, system, turn, seed);
    if tick_signals.is_empty() {
        return tick_signals;
    }
    let reaction_signals = deliver_signals(world, system, &tick_signals, seed);
    let mut all = tick_signals;
    all.extend(reaction_signals);
    all
}

// ---------------------------------------------------------------------------
// Signal helpers
// ---------------------------------------------------------------------------

/// Check if any signal matches the predicate.
pub fn has_signal(signals: &[Signal], predicate: impl Fn(&SignalKind) -> bool) -> bool {
    signals.iter().any(|s| predicate(&s.kind))
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

/// Assert a float is approximately equal, with a named context message.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{msg}: expected ~{expected} (+-{tolerance}), got {actual}"
    );
}
