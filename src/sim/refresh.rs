use super::context::TickContext;
use super::signal::SignalKind;
use super::system::{SimSystem, TurnPhase};

/// Restores movement for the next turn.
///
/// Vehicles whose crew was replaced this turn stay grounded for one more turn.
pub struct RefreshSystem;

impl SimSystem for RefreshSystem {
    fn name(&self) -> &str {
        "refresh"
    }

    fn phase(&self) -> TurnPhase {
        TurnPhase::Refresh
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let ids: Vec<_> = ctx.world.units.keys().copied().collect();
        for id in ids {
            ctx.world.refresh_movement(id);
            if let Some(vehicle) = ctx
                .world
                .unit_mut(id)
                .and_then(|u| u.kind.as_vehicle_mut())
            {
                vehicle.crew_replacing = false;
            }
        }
    }

    fn handle_signals(&mut self, ctx: &mut TickContext) {
        for signal in ctx.inbox {
            if let SignalKind::CrewReplaced { vehicle_id } = signal.kind {
                if let Some(vehicle) = ctx
                    .world
                    .unit_mut(vehicle_id)
                    .and_then(|u| u.kind.as_vehicle_mut())
                {
                    vehicle.crew_replacing = true;
                }
            }
        }
    }
}
