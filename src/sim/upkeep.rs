use super::context::TickContext;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TurnPhase};
use crate::model::DeathCause;

/// Runs the availability, consumption and penalty passes for every unit.
pub struct UpkeepSystem;

impl SimSystem for UpkeepSystem {
    fn name(&self) -> &str {
        "upkeep"
    }

    fn phase(&self) -> TurnPhase {
        TurnPhase::Upkeep
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let turn = ctx.world.turn;
        for unit_id in ctx.world.resolve_turn_upkeep() {
            ctx.signals.push(Signal {
                turn,
                kind: SignalKind::UnitDied {
                    unit_id,
                    cause: DeathCause::Upkeep,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKey, Permission, World};
    use crate::testutil::{seeded_rng, surface, tick_system, worker_at};

    #[test]
    fn starving_twice_signals_death() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        world
            .tile_mut(surface(0, 0))
            .change_inventory(&ItemKey::Water, 2.0);

        let signals = tick_system(&mut world, &mut UpkeepSystem, 1, 0);
        assert!(signals.is_empty());
        assert!(world.unit(worker).unwrap().get_permission(Permission::Starvation));

        let signals = tick_system(&mut world, &mut UpkeepSystem, 2, 0);
        assert_eq!(
            signals,
            vec![Signal {
                turn: 2,
                kind: SignalKind::UnitDied {
                    unit_id: worker,
                    cause: DeathCause::Upkeep,
                },
            }]
        );
    }
}
