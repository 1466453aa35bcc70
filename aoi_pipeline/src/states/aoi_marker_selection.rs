use crate::command::{Action, Operation};
use crate::display::{PointerEvent, PointerKind};
use crate::error::Result;
use crate::image_utils;
use crate::types::{Marker, MarkerId};
use crate::vsm::{StateContext, StateKind, WorkflowState};
use aoigeom::SpatialGrid;
use image::RgbImage;
use std::collections::BTreeSet;

const GRID_CELL_SIZE: f32 = 64.0;

/// Second AOI step: click markers to attach them to the AOI.
///
/// The marker batch is captured once on entry so the clickable outlines do
/// not move while the operator is choosing.
pub struct AoiMarkerSelectionState {
    markers: Vec<Marker>,
    grid: SpatialGrid<MarkerId>,
    selected: BTreeSet<MarkerId>,
}

impl Default for AoiMarkerSelectionState {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            grid: SpatialGrid::new(GRID_CELL_SIZE),
            selected: BTreeSet::new(),
        }
    }
}

impl AoiMarkerSelectionState {
    fn toggle(&mut self, id: MarkerId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }
}

impl WorkflowState for AoiMarkerSelectionState {
    fn kind(&self) -> StateKind {
        StateKind::AoiMarkerSelection
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.accept_origins(
            StateKind::AoiMarkerSelection,
            &[Some(StateKind::AoiName), Some(StateKind::AoiDraw)],
        )?;

        self.markers = ctx.session.markers().get();
        self.grid.clear();
        for marker in &self.markers {
            self.grid.insert_polygon(&marker.polygon(), marker.id);
        }
        // coming back from the draw step keeps the earlier choice
        self.selected = ctx.draft()?.selected_marker_ids.clone();
        log::info!("{} markers available for selection", self.grid.len());

        ctx.capture_clicks();
        ctx.register_cancel();
        ctx.register(
            "d",
            "Save the currently selected markers and continue with drawing the AOI.",
            Action::Invoke(Operation::ConfirmMarkers),
        );
        Ok(())
    }

    fn on_pointer(&mut self, event: PointerEvent, _ctx: &mut StateContext<'_>) -> Result<()> {
        let hits = self.grid.query(event.point());
        match event.kind {
            PointerKind::LeftDown => hits.into_iter().for_each(|id| self.toggle(id)),
            PointerKind::RightDown => hits.iter().for_each(|id| {
                self.selected.remove(id);
            }),
            PointerKind::Move => return Ok(()),
        }
        log::debug!("Selected markers: {:?}", self.selected);
        Ok(())
    }

    fn invoke(&mut self, op: Operation, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        if op != Operation::ConfirmMarkers {
            return Ok(None);
        }
        let draft = ctx.draft()?;
        draft.selected_marker_ids = self.selected.clone();
        if self.selected.is_empty() {
            log::warn!("No markers selected for the AOI '{}'", draft.name);
        } else {
            log::info!(
                "You selected the markers with the IDs {:?} for the AOI with name {}",
                self.selected,
                draft.name
            );
        }
        Ok(Some(StateKind::AoiDraw))
    }

    fn help_text(&self) -> &str {
        "Left click a marker to toggle it, right click to deselect."
    }

    fn draw_overlay(&self, canvas: &mut RgbImage) {
        image_utils::draw_markers(canvas, &self.markers, &self.selected);
    }

    fn selection(&self) -> Option<&BTreeSet<MarkerId>> {
        Some(&self.selected)
    }
}
