use crate::error::Result;
use crate::vsm::{StateContext, StateKind, WorkflowState};

/// Terminal state: releases the pipeline and stops the tick loop
pub struct ExitingState;

impl WorkflowState for ExitingState {
    fn kind(&self) -> StateKind {
        StateKind::Exiting
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        if ctx.session.release_output()? {
            log::debug!("Pushed a sentinel to the output channel");
        }
        ctx.session.request_stop();
        log::info!("Exiting...");
        Ok(())
    }
}
