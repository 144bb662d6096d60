use crate::context::SimContext;
use crate::error::SimResult;

/// A hook that runs around each global time step.
///
/// Systems run in registration order. `pre_step` sees the clock before it
/// advances and `post_step` sees it afterwards.
pub trait System: std::fmt::Debug {
    /// Human-readable name for this system.
    fn name(&self) -> &str;

    /// Called before the global clock advances.
    fn pre_step(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Called after the step and its area sweep.
    fn post_step(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Support downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
