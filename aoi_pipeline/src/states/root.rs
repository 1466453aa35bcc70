use crate::command::Action;
use crate::error::Result;
use crate::vsm::{StateContext, StateKind, WorkflowState};

/// Top of the hierarchy; owns the commands reachable from every state
pub struct RootState;

impl WorkflowState for RootState {
    fn kind(&self) -> StateKind {
        StateKind::Root
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.register("q", "Quit.", Action::GoTo(StateKind::Exiting));
        Ok(())
    }
}
