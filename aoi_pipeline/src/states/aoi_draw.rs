use crate::command::{Action, Operation};
use crate::display::{PointerEvent, PointerKind};
use crate::error::{Result, SessionError};
use crate::image_utils::{self, DRAFT_COLOR};
use crate::vsm::{StateContext, StateKind, WorkflowState};
use aoigeom::{Point, Polygon};
use image::RgbImage;

/// Only the most recent clicks form the boundary
const MAX_POINTS: usize = 4;

/// Last AOI step: click the boundary corners, then commit
#[derive(Default)]
pub struct AoiDrawState {
    points: Vec<Point>,
}

impl AoiDrawState {
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl WorkflowState for AoiDrawState {
    fn kind(&self) -> StateKind {
        StateKind::AoiDraw
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        ctx.accept_origins(
            StateKind::AoiDraw,
            &[Some(StateKind::AoiMarkerSelection), Some(StateKind::AoiName)],
        )?;
        self.points.clear();
        ctx.capture_clicks();
        ctx.register_cancel();
        ctx.register(
            "d",
            "Save the current AOI and continue to the next step.",
            Action::Invoke(Operation::CommitAoi),
        );
        ctx.register(
            "r",
            "Delete all selected points.",
            Action::Invoke(Operation::ResetPoints),
        );
        ctx.register(
            "m",
            "Go back and adjust the marker selection.",
            Action::GoTo(StateKind::AoiMarkerSelection),
        );
        Ok(())
    }

    fn on_pointer(&mut self, event: PointerEvent, _ctx: &mut StateContext<'_>) -> Result<()> {
        if event.kind == PointerKind::LeftDown {
            self.points.push(event.point());
            if self.points.len() > MAX_POINTS {
                self.points.remove(0);
            }
        }
        Ok(())
    }

    fn invoke(&mut self, op: Operation, ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        match op {
            Operation::ResetPoints => {
                self.points.clear();
                Ok(None)
            }
            Operation::CommitAoi => {
                let aoi = match ctx.draft()?.commit(Polygon::new(self.points.clone())) {
                    Ok(aoi) => aoi,
                    Err(e @ SessionError::IncompleteAoi(_)) => {
                        log::warn!("{}", e);
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                log::info!(
                    "Saved AOI '{}' with markers {:?} and {} boundary points",
                    aoi.name,
                    aoi.selected_marker_ids,
                    aoi.boundary.len()
                );
                if let Some(old) = ctx.session.aois_mut().commit(aoi) {
                    log::info!("Replaced the earlier AOI '{}'", old.name);
                }
                Ok(Some(StateKind::AoiName))
            }
            _ => Ok(None),
        }
    }

    fn help_text(&self) -> &str {
        "Left click to place the AOI corners."
    }

    fn draw_overlay(&self, canvas: &mut RgbImage) {
        image_utils::draw_polyline(canvas, &self.points, DRAFT_COLOR);
        if self.points.len() >= 3 {
            image_utils::draw_polygon(canvas, &Polygon::new(self.points.clone()), DRAFT_COLOR, 1);
        }
        for p in &self.points {
            image_utils::draw_point(canvas, *p, 3, DRAFT_COLOR);
        }
    }
}
