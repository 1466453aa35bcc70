use crate::command::{Action, Operation};
use crate::error::Result;
use crate::vsm::{StateContext, StateKind, WorkflowState};

/// Playback running, nothing selected
pub struct InitialState;

impl WorkflowState for InitialState {
    fn kind(&self) -> StateKind {
        StateKind::Initial
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.register("p", "Pause playback.", Action::GoTo(StateKind::Paused));
        ctx.register("a", "Start defining AOI.", Action::GoTo(StateKind::DefineAoi));
        ctx.register(
            "l",
            "List the AOIs defined so far.",
            Action::Invoke(Operation::ListAois),
        );
        Ok(())
    }

    fn invoke(&mut self, op: Operation, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        if op == Operation::ListAois {
            let aois = ctx.session.aois();
            if aois.is_empty() {
                log::info!("No AOIs defined yet");
            }
            for aoi in aois.iter() {
                log::info!(
                    "AOI '{}': markers {:?}, {} boundary points",
                    aoi.name,
                    aoi.selected_marker_ids,
                    aoi.boundary.len()
                );
            }
        }
        Ok(None)
    }

    fn help_text(&self) -> &str {
        "Playback is running."
    }
}
