use super::context::TickContext;

/// Stage of the end-of-turn pipeline a system belongs to.
///
/// Declaration order is execution order: upkeep penalties can kill units
/// before routes move them or attrition rolls for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TurnPhase {
    Upkeep,
    Movement,
    Attrition,
    Refresh,
}

impl TurnPhase {
    pub const ALL: [TurnPhase; 4] = [
        TurnPhase::Upkeep,
        TurnPhase::Movement,
        TurnPhase::Attrition,
        TurnPhase::Refresh,
    ];
}

/// A pluggable simulation system that runs once per turn.
///
/// Object-safe so systems can be stored as `Box<dyn SimSystem>`.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn phase(&self) -> TurnPhase;
    fn tick(&mut self, ctx: &mut TickContext);

    /// React to signals emitted by other systems during Phase 1 (`tick()`).
    ///
    /// Called once per turn with the full signal buffer in `ctx.inbox`.
    /// Signals pushed to `ctx.signals` here are **not** re-delivered (single-pass).
    /// Default: no-op.
    fn handle_signals(&mut self, ctx: &mut TickContext) {
        let _ = ctx;
    }
}
