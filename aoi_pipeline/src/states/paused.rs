use crate::command::{Action, Operation};
use crate::error::Result;
use crate::vsm::{StateContext, StateKind, WorkflowState};

pub struct PausedState;

impl WorkflowState for PausedState {
    fn kind(&self) -> StateKind {
        StateKind::Paused
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.accept_origins(StateKind::Paused, &[Some(StateKind::Initial)])?;
        ctx.register_cancel();
        ctx.register("p", "Resume playback.", Action::GoTo(StateKind::Initial));
        ctx.register(
            "n",
            "Advance a single frame.",
            Action::Invoke(Operation::StepFrame),
        );
        Ok(())
    }

    fn invoke(&mut self, op: Operation, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        if op == Operation::StepFrame {
            ctx.session.request_step();
        }
        Ok(None)
    }

    fn help_text(&self) -> &str {
        "Playback is paused."
    }

    fn pauses_playback(&self) -> bool {
        true
    }
}
