/// Common detector interface for the per-frame analyses
///
/// The pipeline fans every frame out to all registered detectors. A detector
/// only ever reads the pristine frame; its overlay is drawn separately onto
/// the shared composite.
use crate::error::Result;
use crate::image_utils;
use crate::types::{CapabilityParams, DetectionBatch, Frame};
use image::RgbImage;
use std::collections::BTreeSet;

pub trait Detector: Send + Sync {
    /// Detector name (for logging/debugging)
    fn name(&self) -> &str;

    /// Analyse a single frame
    fn detect(&self, frame: &Frame, params: &CapabilityParams) -> Result<DetectionBatch>;

    /// Draw this detector's findings onto the composite
    fn draw(&self, batch: &DetectionBatch, canvas: &mut RgbImage) {
        match batch {
            DetectionBatch::Hands(hands) => image_utils::draw_hands(canvas, hands),
            DetectionBatch::Markers(markers) => {
                image_utils::draw_markers(canvas, markers, &BTreeSet::new())
            }
        }
    }
}
