use super::context::TickContext;
use super::signal::{Signal, SignalKind};
use super::system::{SimSystem, TurnPhase};
use crate::model::DeathCause;
use crate::units::AttritionOutcome;

/// Rolls health attrition for every independent unit.
pub struct AttritionSystem;

impl SimSystem for AttritionSystem {
    fn name(&self) -> &str {
        "attrition"
    }

    fn phase(&self) -> TurnPhase {
        TurnPhase::Attrition
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let turn = ctx.world.turn;
        for unit_id in ctx.world.independent_units() {
            if !ctx.world.is_alive(unit_id) {
                continue;
            }
            let Some(outcome) = ctx.world.roll_health_attrition(unit_id, ctx.rng) else {
                continue;
            };
            let kind = match outcome {
                AttritionOutcome::WorkerReplaced { worker } => SignalKind::WorkerReplaced {
                    group_id: unit_id,
                    worker_id: worker,
                },
                AttritionOutcome::OfficerReplaced { officer } => SignalKind::OfficerReplaced {
                    group_id: unit_id,
                    officer_id: officer,
                },
                AttritionOutcome::CrewReplaced { vehicle, .. } => SignalKind::CrewReplaced {
                    vehicle_id: vehicle,
                },
                AttritionOutcome::Died => SignalKind::UnitDied {
                    unit_id,
                    cause: DeathCause::Attrition,
                },
            };
            ctx.signals.push(Signal { turn, kind });
        }
    }
}
