/// Fixed pool of detection workers sharing one input/output channel pair
///
/// Shutdown is in-band: one sentinel per live worker goes into the input
/// channel, each worker consumes exactly one and exits, then the threads are
/// joined. Frames still queued behind the sentinels are abandoned. A worker
/// leaves the live count before its last channel operation, so a worker
/// that died on a detector failure is never sent a sentinel.
use crate::channel::FrameChannel;
use crate::detection_worker::{DetectionWorker, WorkerContext};
use crate::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub struct WorkerPool {
    workers: Vec<Worker>,
    input: FrameChannel,
    output: FrameChannel,
    live: Arc<AtomicUsize>,
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<Result<u64>>>,
}

impl WorkerPool {
    /// Spawn `num_workers` threads named `detection-worker-{i}`
    pub fn new(num_workers: usize, ctx: WorkerContext) -> Result<Self> {
        let input = ctx.input.clone();
        let output = ctx.output.clone();
        let mut workers = Vec::with_capacity(num_workers);
        let live = Arc::new(AtomicUsize::new(0));

        for id in 0..num_workers {
            live.fetch_add(1, Ordering::SeqCst);
            let worker = DetectionWorker::new(id, ctx.clone()).with_live_counter(Arc::clone(&live));
            let thread = thread::Builder::new()
                .name(format!("detection-worker-{}", id))
                .spawn(move || worker.run())?;
            workers.push(Worker {
                id,
                thread: Some(thread),
            });
        }

        log::info!("✓ Worker pool started with {} workers", num_workers);
        Ok(Self {
            workers,
            input,
            output,
            live,
        })
    }

    pub fn input(&self) -> &FrameChannel {
        &self.input
    }

    pub fn output(&self) -> &FrameChannel {
        &self.output
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Workers still reading the input channel
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop every worker and join the threads. Returns the total number of
    /// frames processed by workers that exited cleanly. Safe to call twice.
    pub fn shutdown(&mut self) -> Result<u64> {
        let live = self.live_workers();
        for _ in 0..live {
            self.input.put_sentinel()?;
        }

        let mut total = 0;
        for worker in &mut self.workers {
            let Some(thread) = worker.thread.take() else {
                continue;
            };
            match thread.join() {
                Ok(Ok(frames)) => total += frames,
                Ok(Err(e)) => log::warn!("Detection worker {} exited with error: {}", worker.id, e),
                Err(_) => log::error!("❌ Detection worker {} panicked", worker.id),
            }
        }
        if live > 0 {
            log::info!("Worker pool shut down, {} frames processed", total);
        }
        Ok(total)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("❌ Worker pool shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::detection_worker::tests::FailingDetector;
    use crate::detection_worker::DetectorBinding;
    use crate::detector_trait::Detector;
    use crate::error::SessionError;
    use crate::types::{CapabilityParams, DetectionBatch, Frame};
    use crossbeam::channel::{unbounded, Receiver, Sender};
    use image::RgbImage;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Blocks each detection until the test releases it
    struct GatedDetector {
        gate: Receiver<()>,
    }

    impl Detector for GatedDetector {
        fn name(&self) -> &str {
            "gated"
        }

        fn detect(&self, _frame: &Frame, _params: &CapabilityParams) -> crate::error::Result<DetectionBatch> {
            self.gate
                .recv()
                .map_err(|_| SessionError::detector("gated", "gate closed"))?;
            Ok(DetectionBatch::Hands(Vec::new()))
        }
    }

    fn context(capacity: usize, detector: Arc<dyn Detector>) -> WorkerContext {
        WorkerContext {
            input: FrameChannel::new(capacity),
            output: FrameChannel::new(capacity),
            detectors: vec![DetectorBinding::unbounded(detector)],
            params: Arc::new(CapabilityParams::default()),
            markers: None,
            failure_policy: FailurePolicy::Propagate,
        }
    }

    fn gated() -> (Sender<()>, Arc<dyn Detector>) {
        let (tx, rx) = unbounded();
        (tx, Arc::new(GatedDetector { gate: rx }))
    }

    fn frame(id: u64) -> Option<Frame> {
        Some(Frame::new(id, RgbImage::new(8, 8)))
    }

    fn wait_until(cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_frames_flow_through_pool() {
        let (gate, detector) = gated();
        let mut pool = WorkerPool::new(2, context(4, detector)).unwrap();
        assert_eq!(pool.num_workers(), 2);

        for id in 0..4 {
            gate.send(()).unwrap();
            pool.input().put(frame(id)).unwrap();
        }
        let mut ids: Vec<u64> = (0..4)
            .map(|_| pool.output().get().unwrap().unwrap().frame_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        assert_eq!(pool.shutdown().unwrap(), 4);
        assert_eq!(pool.live_workers(), 0);
    }

    #[test]
    fn test_capacity_one_backpressure() {
        let (gate, detector) = gated();
        let pool = WorkerPool::new(1, context(1, detector)).unwrap();
        let input = pool.input().clone();

        // worker takes frame 0 and blocks in the detector
        input.put(frame(0)).unwrap();
        wait_until(|| input.is_empty());
        // frame 1 fills the input slot, frame 2 is refused
        input.put(frame(1)).unwrap();
        assert!(input.try_put(frame(2)).is_err());

        gate.send(()).unwrap();
        assert_eq!(pool.output().get().unwrap().unwrap().frame_id, 0);
        // the worker moves on to frame 1, freeing exactly one slot
        wait_until(|| input.is_empty());
        assert!(input.try_put(frame(2)).is_ok());
        assert!(input.try_put(frame(3)).is_err());

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        assert_eq!(pool.output().get().unwrap().unwrap().frame_id, 1);
        assert_eq!(pool.output().get().unwrap().unwrap().frame_id, 2);
    }

    #[test]
    fn test_shutdown_joins_idle_workers() {
        let (_gate, detector) = gated();
        let mut pool = WorkerPool::new(3, context(2, detector)).unwrap();
        assert_eq!(pool.shutdown().unwrap(), 0);
        // the sentinels were consumed one per worker
        assert!(pool.input().is_empty());
        // second call is a no-op
        assert_eq!(pool.shutdown().unwrap(), 0);
    }

    #[test]
    fn test_dead_worker_is_not_sent_a_sentinel() {
        let mut pool = WorkerPool::new(1, context(2, Arc::new(FailingDetector))).unwrap();
        assert_eq!(pool.live_workers(), 1);
        pool.input().put(frame(0)).unwrap();
        assert!(pool.output().get().unwrap().is_none());
        // retired before the failure sentinel was pushed, even if the
        // thread is still winding down
        assert_eq!(pool.live_workers(), 0);

        pool.shutdown().unwrap();
        assert!(pool.input().is_empty());
    }

    #[test]
    fn test_live_count_tracks_sentinels() {
        let (gate, detector) = gated();
        let mut pool = WorkerPool::new(3, context(2, detector)).unwrap();
        assert_eq!(pool.live_workers(), 3);

        gate.send(()).unwrap();
        pool.input().put(frame(0)).unwrap();
        pool.output().get().unwrap().unwrap();
        assert_eq!(pool.live_workers(), 3);

        pool.input().put_sentinel().unwrap();
        wait_until(|| pool.live_workers() == 2);
        assert_eq!(pool.shutdown().unwrap(), 1);
        assert_eq!(pool.live_workers(), 0);
        assert!(pool.input().is_empty());
    }
}
