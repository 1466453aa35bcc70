// Stub detectors returning configured results
// Used by the demo and tests in place of real hand/marker models

use crate::detector_trait::Detector;
use crate::error::Result;
use crate::types::{CapabilityParams, DetectionBatch, Frame, HandDetection, Marker};
use std::time::Duration;

/// Reports a fixed set of hands, filtered like a real detector would be
pub struct StubHandDetector {
    hands: Vec<HandDetection>,
    latency: Option<Duration>,
}

impl StubHandDetector {
    pub fn new(hands: Vec<HandDetection>) -> Self {
        log::info!("Creating stub hand detector with {} hands", hands.len());
        Self {
            hands,
            latency: None,
        }
    }

    /// Sleep this long per frame to mimic inference cost
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl Detector for StubHandDetector {
    fn name(&self) -> &str {
        "stub-hands"
    }

    fn detect(&self, _frame: &Frame, params: &CapabilityParams) -> Result<DetectionBatch> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        let mut hands: Vec<HandDetection> = self
            .hands
            .iter()
            .filter(|h| h.confidence >= params.score_threshold)
            .cloned()
            .collect();
        hands.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        hands.truncate(params.max_hands);
        Ok(DetectionBatch::Hands(hands))
    }
}

/// Reports the same markers on every frame
pub struct StubMarkerDetector {
    markers: Vec<Marker>,
    latency: Option<Duration>,
}

impl StubMarkerDetector {
    pub fn new(markers: Vec<Marker>) -> Self {
        log::info!("Creating stub marker detector with {} markers", markers.len());
        Self {
            markers,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl Detector for StubMarkerDetector {
    fn name(&self) -> &str {
        "stub-markers"
    }

    fn detect(&self, _frame: &Frame, _params: &CapabilityParams) -> Result<DetectionBatch> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        Ok(DetectionBatch::Markers(self.markers.clone()))
    }
}
