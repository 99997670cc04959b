use super::context::TickContext;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TurnPhase};

/// Advances every independent unit that has an automatic route.
pub struct RouteSystem;

impl SimSystem for RouteSystem {
    fn name(&self) -> &str {
        "routes"
    }

    fn phase(&self) -> TurnPhase {
        TurnPhase::Movement
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let turn = ctx.world.turn;
        let routed: Vec<_> = ctx
            .world
            .units
            .values()
            .filter(|u| u.is_independent() && !u.automatic_route.is_empty())
            .map(|u| u.id)
            .collect();
        for unit_id in routed {
            if !ctx.world.is_alive(unit_id) {
                continue;
            }
            let steps = ctx.world.follow_automatic_route(unit_id);
            if steps > 0 {
                ctx.signals.push(Signal {
                    turn,
                    kind: SignalKind::RouteAdvanced { unit_id, steps },
                });
            }
        }
    }
}
