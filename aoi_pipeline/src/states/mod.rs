//! The workflow states of an interactive session

mod aoi_draw;
mod aoi_marker_selection;
mod aoi_name;
mod define_aoi;
mod exiting;
mod initial;
mod paused;
mod root;

pub use aoi_draw::AoiDrawState;
pub use aoi_marker_selection::AoiMarkerSelectionState;
pub use aoi_name::AoiNameState;
pub use define_aoi::DefineAoiState;
pub use exiting::ExitingState;
pub use initial::InitialState;
pub use paused::PausedState;
pub use root::RootState;

use crate::vsm::{StateKind, WorkflowState};

/// Fresh, not yet entered state of the given kind
pub fn create(kind: StateKind) -> Box<dyn WorkflowState> {
    match kind {
        StateKind::Root => Box::new(RootState),
        StateKind::Initial => Box::new(InitialState),
        StateKind::Paused => Box::new(PausedState),
        StateKind::DefineAoi => Box::new(DefineAoiState::default()),
        StateKind::AoiName => Box::new(AoiNameState),
        StateKind::AoiMarkerSelection => Box::new(AoiMarkerSelectionState::default()),
        StateKind::AoiDraw => Box::new(AoiDrawState::default()),
        StateKind::Exiting => Box::new(ExitingState),
    }
}
