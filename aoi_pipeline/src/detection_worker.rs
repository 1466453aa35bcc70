/// Detection worker - fans a frame out to every detector and composites the overlays
///
/// Each detector runs on its own scoped thread against the untouched input
/// frame. Results go to the detector's side channel first, then the overlay
/// is drawn onto the shared composite under its lock. All detector threads
/// are joined before the composite is released.
use crate::channel::{FrameChannel, SideChannel};
use crate::config::FailurePolicy;
use crate::detector_trait::Detector;
use crate::error::{Result, SessionError};
use crate::sync_cell::{MarkerSnapshot, SynchronizedCell};
use crate::types::{CapabilityParams, DetectionBatch, Frame};
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// A detector together with the side channel its batches are published on
#[derive(Clone)]
pub struct DetectorBinding {
    pub detector: Arc<dyn Detector>,
    pub results: SideChannel,
}

impl DetectorBinding {
    /// Bind `detector` to `results`, which must be unbounded: a full side
    /// channel would block the detector thread and with it the whole worker.
    pub fn new(detector: Arc<dyn Detector>, results: SideChannel) -> Result<Self> {
        if let Some(capacity) = results.capacity() {
            return Err(SessionError::config(format!(
                "side channel of detector {} is bounded to {}",
                detector.name(),
                capacity
            )));
        }
        Ok(Self { detector, results })
    }

    /// Bind to a fresh unbounded side channel
    pub fn unbounded(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            results: SideChannel::unbounded(),
        }
    }
}

/// Everything a worker shares with its siblings
#[derive(Clone)]
pub struct WorkerContext {
    pub input: FrameChannel,
    pub output: FrameChannel,
    pub detectors: Vec<DetectorBinding>,
    pub params: Arc<CapabilityParams>,
    pub markers: Option<MarkerSnapshot>,
    pub failure_policy: FailurePolicy,
}

pub struct DetectionWorker {
    id: usize,
    ctx: WorkerContext,
    frames_processed: u64,
    // workers still consuming the input channel
    live: Option<Arc<AtomicUsize>>,
}

impl DetectionWorker {
    pub fn new(id: usize, ctx: WorkerContext) -> Self {
        Self {
            id,
            ctx,
            frames_processed: 0,
            live: None,
        }
    }

    /// Decrement `live` once this worker stops reading the input channel
    pub fn with_live_counter(mut self, live: Arc<AtomicUsize>) -> Self {
        self.live = Some(live);
        self
    }

    // Must happen before the last channel operation so the pool never
    // counts a worker that will not take another sentinel
    fn retire(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Run every detector on `frame` and return the composited image
    pub fn process(&self, frame: &Frame) -> Result<RgbImage> {
        let composite = SynchronizedCell::new(frame.image.clone());

        let outcomes: Vec<(String, Result<()>)> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .ctx
                .detectors
                .iter()
                .map(|binding| {
                    let composite = &composite;
                    let handle = scope.spawn(move || self.run_detector(binding, frame, composite));
                    (binding.detector.name().to_string(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(SessionError::detector(name.clone(), "detector thread panicked"))
                    });
                    (name, outcome)
                })
                .collect()
        });

        for (name, outcome) in outcomes {
            if let Err(e) = outcome {
                match self.ctx.failure_policy {
                    FailurePolicy::Propagate => return Err(e),
                    FailurePolicy::SkipOverlay => {
                        log::warn!(
                            "⚠️  Worker {} skipping '{}' on frame {}: {}",
                            self.id,
                            name,
                            frame.frame_id,
                            e
                        );
                    }
                }
            }
        }

        Ok(composite.take())
    }

    fn run_detector(
        &self,
        binding: &DetectorBinding,
        frame: &Frame,
        composite: &SynchronizedCell<RgbImage>,
    ) -> Result<()> {
        let detector = &binding.detector;
        let batch = detector
            .detect(frame, &self.ctx.params)
            .map_err(|e| match e {
                e @ SessionError::DetectorFailure { .. } => e,
                other => SessionError::detector(detector.name(), other.to_string()),
            })?;

        if let (DetectionBatch::Markers(markers), Some(snapshot)) = (&batch, &self.ctx.markers) {
            snapshot.set(markers.clone());
        }

        binding.results.put(Some(batch.clone()))?;
        composite.update(|canvas| detector.draw(&batch, canvas));
        Ok(())
    }

    /// Worker loop: runs until a sentinel arrives or a detector failure is propagated
    pub fn run(mut self) -> Result<u64> {
        log::debug!("Detection worker {} started", self.id);
        loop {
            let frame = match self.ctx.input.get() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.retire();
                    log::debug!("Detection worker {} received sentinel", self.id);
                    break;
                }
                Err(e) => {
                    self.retire();
                    return Err(e);
                }
            };

            match self.process(&frame) {
                Ok(image) => {
                    self.frames_processed += 1;
                    self.ctx.output.put(Some(Frame { image, ..frame }))?;
                }
                Err(e) => {
                    log::error!("❌ Detection worker {} failed: {}", self.id, e);
                    self.retire();
                    // release a driver blocked on the output channel
                    self.ctx.output.put_sentinel()?;
                    return Err(e);
                }
            }
        }
        log::info!(
            "Detection worker {} finished, {} frames processed",
            self.id,
            self.frames_processed
        );
        Ok(self.frames_processed)
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.retire();
    }
}
