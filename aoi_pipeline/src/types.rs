//! Type definitions for frames, detections and areas of interest

use crate::error::{Result, SessionError};
use aoigeom::{Bbox, Point, Polygon};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

/// Fiducial marker identifier as decoded by the marker detector
pub type MarkerId = u32;

/// A single video frame travelling through the pipeline
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonically increasing id assigned by the frame source
    pub frame_id: u64,
    pub image: RgbImage,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(frame_id: u64, image: RgbImage) -> Self {
        Self {
            frame_id,
            image,
            timestamp: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Immutable per-run detector configuration shared by every worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityParams {
    /// Minimum confidence for a hand detection to be kept
    pub score_threshold: f32,
    /// Maximum number of hands reported per frame
    pub max_hands: usize,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for CapabilityParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.2,
            max_hands: 2,
            frame_width: 888,
            frame_height: 500,
        }
    }
}

/// A detected hand in pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub bbox: Bbox,
    pub center: Point,
    pub confidence: f32,
}

impl HandDetection {
    pub fn new(bbox: Bbox, confidence: f32) -> Self {
        Self {
            center: bbox.center(),
            bbox,
            confidence,
        }
    }

    /// Build from a normalized `[ymin, xmin, ymax, xmax]` box
    pub fn from_normalized(normalized: [f32; 4], confidence: f32, params: &CapabilityParams) -> Self {
        Self::new(
            Bbox::from_normalized(normalized, params.frame_width, params.frame_height),
            confidence,
        )
    }
}

/// A detected fiducial marker with its four image-space corners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub corners: Vec<[i32; 2]>,
}

impl Marker {
    pub fn new(id: MarkerId, corners: Vec<[i32; 2]>) -> Self {
        Self { id, corners }
    }

    /// Axis-aligned square marker, handy for fixtures
    pub fn square(id: MarkerId, x: i32, y: i32, size: i32) -> Self {
        Self::new(
            id,
            vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]],
        )
    }

    pub fn polygon(&self) -> Polygon {
        Polygon::from_corners(&self.corners)
    }
}

/// One detector's findings for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionBatch {
    Hands(Vec<HandDetection>),
    Markers(Vec<Marker>),
}

impl DetectionBatch {
    pub fn len(&self) -> usize {
        match self {
            DetectionBatch::Hands(hands) => hands.len(),
            DetectionBatch::Markers(markers) => markers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DetectionBatch::Hands(_) => "hands",
            DetectionBatch::Markers(_) => "markers",
        }
    }
}

/// A committed, named area of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aoi {
    pub name: String,
    pub selected_marker_ids: BTreeSet<MarkerId>,
    pub boundary: Polygon,
}

/// An AOI under construction, owned by the define-AOI workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AoiDraft {
    pub name: String,
    pub selected_marker_ids: BTreeSet<MarkerId>,
}

impl AoiDraft {
    pub fn reset(&mut self) {
        self.name.clear();
        self.selected_marker_ids.clear();
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Finalize the draft with a drawn boundary
    pub fn commit(&self, boundary: Polygon) -> Result<Aoi> {
        if !self.has_name() {
            return Err(SessionError::IncompleteAoi("AOI has no name".to_string()));
        }
        if !boundary.is_closed_shape() {
            return Err(SessionError::IncompleteAoi(format!(
                "AOI '{}' needs at least 3 boundary points, got {}",
                self.name,
                boundary.len()
            )));
        }
        Ok(Aoi {
            name: self.name.clone(),
            selected_marker_ids: self.selected_marker_ids.clone(),
            boundary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_center_from_normalized() {
        let params = CapabilityParams::default();
        let hand = HandDetection::from_normalized([0.0, 0.0, 0.5, 0.5], 0.9, &params);
        assert_eq!(hand.center, Point::new(222.0, 125.0));
        assert_eq!(hand.confidence, 0.9);
    }

    #[test]
    fn test_marker_polygon() {
        let marker = Marker::square(3, 10, 10, 20);
        let poly = marker.polygon();
        assert_eq!(poly.len(), 4);
        assert!(poly.contains(Point::new(15.0, 15.0)));
    }

    #[test]
    fn test_batch_len_and_kind() {
        let batch = DetectionBatch::Markers(vec![Marker::square(1, 0, 0, 5)]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.kind(), "markers");
        assert!(DetectionBatch::Hands(Vec::new()).is_empty());
    }

    #[test]
    fn test_draft_commit_requires_name_and_shape() {
        let mut draft = AoiDraft::default();
        let square = Polygon::from_corners(&[[0, 0], [10, 0], [10, 10]]);
        assert!(draft.commit(square.clone()).is_err());

        draft.name = "desk".to_string();
        draft.selected_marker_ids.insert(3);
        assert!(draft
            .commit(Polygon::from_corners(&[[0, 0], [10, 0]]))
            .is_err());

        let aoi = draft.commit(square).unwrap();
        assert_eq!(aoi.name, "desk");
        assert_eq!(aoi.selected_marker_ids, BTreeSet::from([3]));

        draft.reset();
        assert!(!draft.has_name());
        assert!(draft.selected_marker_ids.is_empty());
    }
}
