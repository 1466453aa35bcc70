use crate::error::Result;
use crate::types::AoiDraft;
use crate::vsm::{StateContext, StateKind, WorkflowState};

/// Hosts the name / marker selection / draw steps and owns their draft
#[derive(Default)]
pub struct DefineAoiState {
    draft: AoiDraft,
}

impl WorkflowState for DefineAoiState {
    fn kind(&self) -> StateKind {
        StateKind::DefineAoi
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.accept_origins(
            StateKind::DefineAoi,
            &[Some(StateKind::Initial), Some(StateKind::Paused)],
        )?;
        ctx.register_cancel();
        ctx.delegate(StateKind::AoiName);
        Ok(())
    }

    fn help_text(&self) -> &str {
        "Defining an AOI. Playback is paused."
    }

    fn pauses_playback(&self) -> bool {
        true
    }

    fn draft(&self) -> Option<&AoiDraft> {
        Some(&self.draft)
    }

    fn draft_mut(&mut self) -> Option<&mut AoiDraft> {
        Some(&mut self.draft)
    }
}
