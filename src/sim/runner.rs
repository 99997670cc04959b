use std::io;
use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::attrition::AttritionSystem;
use super::context::TickContext;
use super::refresh::RefreshSystem;
use super::routes::RouteSystem;
use super::system::{SimSystem, TurnPhase};
use super::upkeep::UpkeepSystem;
use crate::flush::flush_to_jsonl;
use crate::model::World;

/// Configuration for a multi-turn run.
pub struct TurnConfig {
    pub num_turns: u32,
    pub seed: u64,
    /// If set, flush world state every N turns.
    pub flush_interval: Option<u32>,
    /// Directory to write flush checkpoints into.
    pub output_dir: Option<PathBuf>,
}

impl TurnConfig {
    pub fn new(num_turns: u32, seed: u64) -> Self {
        Self {
            num_turns,
            seed,
            flush_interval: None,
            output_dir: None,
        }
    }
}

/// The standard end-of-turn pipeline.
pub fn default_systems() -> Vec<Box<dyn SimSystem>> {
    vec![
        Box::new(UpkeepSystem),
        Box::new(RouteSystem),
        Box::new(AttritionSystem),
        Box::new(RefreshSystem),
    ]
}

/// Set `world.turn` and run every system once.
///
/// Signal delivery is **single-pass, non-cascading**:
///
/// 1. **Phase 1 (tick):** systems tick in [`TurnPhase`] order, registration
///    order within a phase. All signals land in a shared buffer.
/// 2. **Phase 2 (react):** if any signals were emitted, each system's
///    `handle_signals()` sees the full buffer as `ctx.inbox`. Signals pushed
///    here are discarded at the end of the turn.
///
/// A reaction that needs to propagate must mutate world state that the next
/// turn's Phase 1 will observe.
pub fn dispatch_turn(
    world: &mut World,
    systems: &mut [Box<dyn SimSystem>],
    rng: &mut dyn RngCore,
    turn: u32,
) {
    world.turn = turn;

    let mut order: Vec<usize> = (0..systems.len()).collect();
    order.sort_by_key(|&i| systems[i].phase());

    // Phase 1: tick systems, collecting signals
    let mut signals = Vec::new();
    for &i in &order {
        let mut ctx = TickContext {
            world,
            rng,
            signals: &mut signals,
            inbox: &[],
        };
        systems[i].tick(&mut ctx);
    }

    // Phase 2: deliver signals for reaction (only if any were emitted)
    if !signals.is_empty() {
        for &i in &order {
            let mut new_signals = Vec::new();
            let mut ctx = TickContext {
                world,
                rng,
                signals: &mut new_signals,
                inbox: &signals,
            };
            systems[i].handle_signals(&mut ctx);
        }
    }
}

/// Run the configured number of turns, starting after `world.turn`.
///
/// The RNG is seeded from `config.seed`, so the same seed always produces the
/// same run.
pub fn run(
    world: &mut World,
    systems: &mut [Box<dyn SimSystem>],
    config: TurnConfig,
) -> io::Result<()> {
    if systems.is_empty() || config.num_turns == 0 {
        return Ok(());
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let start = world.turn;

    for offset in 0..config.num_turns {
        let turn = start + offset + 1;
        dispatch_turn(world, systems, &mut rng, turn);

        // Flush checkpoint at configured interval
        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            let is_last_turn = offset == config.num_turns - 1;
            if is_last_turn || (interval > 0 && (offset + 1) % interval == 0) {
                let checkpoint_dir = dir.join(format!("turn_{turn:06}"));
                flush_to_jsonl(world, &checkpoint_dir)?;
                tracing::debug!(turn, dir = %checkpoint_dir.display(), "flushed checkpoint");
            }
        }
    }
    tracing::info!(
        turns = config.num_turns,
        units = world.units.len(),
        "run complete"
    );
    Ok(())
}
