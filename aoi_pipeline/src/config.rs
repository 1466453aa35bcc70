//! Session configuration loaded from JSON

use crate::error::{Result, SessionError};
use crate::types::CapabilityParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a worker does when one of its detectors fails on a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The worker stops and the error reaches the driver
    #[default]
    Propagate,
    /// Skip that detector's overlay and results for the frame, keep going
    SkipOverlay,
}

/// Run configuration for an interactive session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of detection worker threads
    pub num_workers: usize,
    /// Capacity of the input and output frame channels
    pub queue_size: usize,
    pub score_threshold: f32,
    pub max_hands: usize,
    pub width: u32,
    pub height: u32,
    /// Show composited frames through the renderer
    pub display: bool,
    pub draw_fps: bool,
    pub failure_policy: FailurePolicy,
    /// Frames between progress log lines when display is off
    pub progress_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            queue_size: 5,
            score_threshold: 0.2,
            max_hands: 2,
            width: 888,
            height: 500,
            display: true,
            draw_fps: true,
            failure_policy: FailurePolicy::Propagate,
            progress_interval: 30,
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded session config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(SessionError::config("num_workers must be at least 1"));
        }
        if self.queue_size == 0 {
            return Err(SessionError::config("queue_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(SessionError::config(format!(
                "score_threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(SessionError::config("frame size must be non-zero"));
        }
        Ok(())
    }

    pub fn capability_params(&self) -> CapabilityParams {
        CapabilityParams {
            score_threshold: self.score_threshold,
            max_hands: self.max_hands,
            frame_width: self.width,
            frame_height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.queue_size, 5);
        assert_eq!(config.failure_policy, FailurePolicy::Propagate);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            SessionConfig::from_json(r#"{"num_workers": 2, "failure_policy": "skip_overlay"}"#)
                .unwrap();
        assert_eq!(config.num_workers, 2);
        assert_eq!(config.failure_policy, FailurePolicy::SkipOverlay);
        assert_eq!(config.width, 888);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(SessionConfig::from_json(r#"{"queue_size": 0}"#).is_err());
        assert!(SessionConfig::from_json(r#"{"score_threshold": 1.5}"#).is_err());
        assert!(matches!(
            SessionConfig::from_json("{not json"),
            Err(SessionError::Serialization(_))
        ));
    }

    #[test]
    fn test_capability_params() {
        let params = SessionConfig::default().capability_params();
        assert_eq!(params.frame_width, 888);
        assert_eq!(params.frame_height, 500);
        assert_eq!(params.max_hands, 2);
    }
}
