//! FIFO channels connecting the pipeline stages
//!
//! Shutdown travels in-band: a channel of `Option<T>` carries `None` as the
//! sentinel, and each sentinel wakes exactly one blocked consumer.

use crate::error::{Result, SessionError};
use crate::types::{DetectionBatch, Frame};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TrySendError};

/// Multi-producer multi-consumer FIFO. Clones share the same queue.
pub struct BoundedChannel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Clone for BoundedChannel<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> BoundedChannel<T> {
    /// Fixed-capacity channel. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Unbounded variant for side-channel results
    pub fn unbounded() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Blocks while the channel is full
    pub fn put(&self, item: T) -> Result<()> {
        self.tx
            .send(item)
            .map_err(|_| SessionError::disconnected("put on a closed channel"))
    }

    /// Blocks while the channel is empty
    pub fn get(&self) -> Result<T> {
        self.rx
            .recv()
            .map_err(|_| SessionError::disconnected("get on a closed channel"))
    }

    /// Non-blocking put; hands the item back when the channel is full
    pub fn try_put(&self, item: T) -> std::result::Result<(), T> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) | TrySendError::Disconnected(item) => item,
        })
    }

    pub fn try_get(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn size(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// `None` for the unbounded variant
    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
}

impl<T> BoundedChannel<Option<T>> {
    pub fn put_sentinel(&self) -> Result<()> {
        self.put(None)
    }

    /// Push a sentinel only when nobody could be waiting behind queued items
    pub fn put_sentinel_if_empty(&self) -> Result<bool> {
        if self.is_empty() {
            self.put_sentinel()?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Frames between the driver and the worker pool
pub type FrameChannel = BoundedChannel<Option<Frame>>;

/// Per-detector results flowing to a publisher
pub type SideChannel = BoundedChannel<Option<DetectionBatch>>;
