//! Error types for the AOI session library

use crate::vsm::StateKind;
use thiserror::Error;

/// Result type alias for the session library
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while running a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("An invalid transition was attempted: {} --> {to}", origin_name(.from))]
    InvalidTransition {
        from: Option<StateKind>,
        to: StateKind,
    },

    #[error("Detector '{detector}' failed: {message}")]
    DetectorFailure { detector: String, message: String },

    #[error("Channel disconnected: {0}")]
    ChannelDisconnected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Incomplete AOI: {0}")]
    IncompleteAoi(String),

    #[error("Unrecoverable state machine error: {0}")]
    FatalState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn origin_name(origin: &Option<StateKind>) -> &'static str {
    origin.map(|kind| kind.name()).unwrap_or("<none>")
}

impl SessionError {
    pub fn invalid_transition(from: Option<StateKind>, to: StateKind) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn detector<D: Into<String>, M: Into<String>>(detector: D, message: M) -> Self {
        Self::DetectorFailure {
            detector: detector.into(),
            message: message.into(),
        }
    }

    pub fn disconnected<S: Into<String>>(what: S) -> Self {
        Self::ChannelDisconnected(what.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn fatal<S: Into<String>>(msg: S) -> Self {
        Self::FatalState(msg.into())
    }

    /// Rejections the state machine recovers from by falling back
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = SessionError::invalid_transition(Some(StateKind::Paused), StateKind::Paused);
        assert_eq!(
            err.to_string(),
            "An invalid transition was attempted: Paused --> Paused"
        );
        assert!(err.is_invalid_transition());

        let fresh = SessionError::invalid_transition(None, StateKind::AoiDraw);
        assert!(fresh.to_string().contains("<none> --> AoiDraw"));
    }

    #[test]
    fn test_detector_failure_is_not_recoverable() {
        let err = SessionError::detector("markers", "camera unplugged");
        assert!(!err.is_invalid_transition());
        assert_eq!(
            err.to_string(),
            "Detector 'markers' failed: camera unplugged"
        );
    }
}
