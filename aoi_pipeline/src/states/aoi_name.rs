use crate::command::{Action, Operation};
use crate::error::Result;
use crate::vsm::{StateContext, StateKind, WorkflowState};

/// First AOI step: ask the operator for a name
pub struct AoiNameState;

impl WorkflowState for AoiNameState {
    fn kind(&self) -> StateKind {
        StateKind::AoiName
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.accept_origins(StateKind::AoiName, &[None, Some(StateKind::AoiDraw)])?;
        ctx.draft()?.reset();
        ctx.register_cancel();
        ctx.register(
            "d",
            "Save the current AOI name and continue with selecting the markers for this AOI.",
            Action::Invoke(Operation::ConfirmName),
        );
        Ok(())
    }

    /// Prompt for the name. An answer that is a reachable command key (quit,
    /// cancel, ...) is run as that command instead.
    fn run(&mut self, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        if ctx.draft()?.has_name() {
            return Ok(None);
        }
        let answer = ctx.session.input().prompt("Enter name for AOI: ")?;
        let name = answer.trim();
        if ctx.is_command(name) {
            ctx.forward(name);
            return Ok(None);
        }
        if name.is_empty() {
            log::info!("The AOI name must not be empty");
            return Ok(None);
        }
        ctx.draft()?.name = name.to_string();
        log::info!("AOI name set to '{}'", name);
        Ok(Some(StateKind::AoiMarkerSelection))
    }

    fn invoke(&mut self, op: Operation, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        if op != Operation::ConfirmName {
            return Ok(None);
        }
        if ctx.draft()?.has_name() {
            Ok(Some(StateKind::AoiMarkerSelection))
        } else {
            log::warn!("Enter a name before continuing");
            Ok(None)
        }
    }

    fn help_text(&self) -> &str {
        "Name the new AOI."
    }
}
