//! Interactive AOI definition over a concurrent detection pipeline
//!
//! Frames flow from a [`FrameSource`] through a [`WorkerPool`] where every
//! registered [`Detector`] runs in parallel and draws onto one composite.
//! The [`InteractiveStateMachine`] drives the pipeline one frame per tick and
//! lets an operator pause playback and define named areas of interest by
//! picking detected markers and clicking a boundary.

pub mod channel;
pub mod command;
pub mod config;
pub mod console;
pub mod detection_worker;
pub mod detector_pool;
pub mod detector_stub;
pub mod detector_trait;
pub mod display;
pub mod error;
pub mod image_utils;
pub mod interactive;
pub mod publisher;
pub mod session;
pub mod states;
pub mod sync_cell;
pub mod types;
pub mod video;
pub mod vsm;

pub use channel::{BoundedChannel, FrameChannel, SideChannel};
pub use command::{Action, Command, CommandTable, Operation};
pub use config::{FailurePolicy, SessionConfig};
pub use console::{CommandSource, ScriptedCommandSource, StdinCommandSource};
pub use detection_worker::{DetectionWorker, DetectorBinding, WorkerContext};
pub use detector_pool::WorkerPool;
pub use detector_stub::{StubHandDetector, StubMarkerDetector};
pub use detector_trait::Detector;
pub use display::{ClickHandler, HeadlessRenderer, PointerEvent, PointerKind, Renderer};
pub use error::{Result, SessionError};
pub use interactive::{
    InteractiveStateMachine, InteractiveStateMachineBuilder, SessionSummary, StopReason, Tick,
};
pub use publisher::{LogSink, Packet, PacketSink, ResultPublisher};
pub use session::{AoiRegistry, Session};
pub use sync_cell::{MarkerSnapshot, SynchronizedCell};
pub use types::{
    Aoi, AoiDraft, CapabilityParams, DetectionBatch, Frame, HandDetection, Marker, MarkerId,
};
pub use video::{FrameSource, StillImageSource, SyntheticSource};
pub use vsm::{StateContext, StateId, StateKind, StateTree, WorkflowState};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
