//! Result publisher draining a detector's side channel
//!
//! Each record of a batch becomes one timestamped packet handed to a
//! [`PacketSink`]. No transport is implied; [`LogSink`] just logs the JSON.

use crate::channel::SideChannel;
use crate::error::{Result, SessionError};
use crate::types::{DetectionBatch, MarkerId};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandPacket {
    pub confidence: f32,
    /// `[xmin, ymin, xmax, ymax]` in pixels
    pub bbox: [f32; 4],
    pub center: [f32; 2],
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPacket {
    pub id: MarkerId,
    pub corners: Vec<[i32; 2]>,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum Packet {
    Hand(HandPacket),
    Marker(MarkerPacket),
}

impl Packet {
    /// One packet per record in the batch, all sharing `timestamp_ms`
    pub fn from_batch(batch: &DetectionBatch, timestamp_ms: u64) -> Vec<Packet> {
        match batch {
            DetectionBatch::Hands(hands) => hands
                .iter()
                .map(|hand| {
                    Packet::Hand(HandPacket {
                        confidence: hand.confidence,
                        bbox: hand.bbox.to_bounds(),
                        center: [hand.center.x, hand.center.y],
                        timestamp_ms,
                    })
                })
                .collect(),
            DetectionBatch::Markers(markers) => markers
                .iter()
                .map(|marker| {
                    Packet::Marker(MarkerPacket {
                        id: marker.id,
                        corners: marker.corners.clone(),
                        timestamp_ms,
                    })
                })
                .collect(),
        }
    }
}

/// Destination for published packets
pub trait PacketSink: Send {
    fn publish(&mut self, packet: &Packet) -> Result<()>;
}

/// Logs every packet as a JSON line under the `publish` target
#[derive(Debug, Default)]
pub struct LogSink;

impl PacketSink for LogSink {
    fn publish(&mut self, packet: &Packet) -> Result<()> {
        let json = serde_json::to_string(packet)?;
        log::info!(target: "publish", "{}", json);
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct ResultPublisher {
    name: String,
    channel: SideChannel,
    cancelled: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<u64>>,
}

impl ResultPublisher {
    /// Start a publisher thread draining `channel` into `sink`
    pub fn spawn<S: PacketSink + 'static>(
        name: &str,
        channel: SideChannel,
        mut sink: S,
    ) -> Result<Self> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let rx = channel.clone();
        let flag = Arc::clone(&cancelled);
        let thread_name = name.to_string();

        let thread = thread::Builder::new()
            .name(format!("publisher-{}", name))
            .spawn(move || {
                let mut published = 0_u64;
                while let Ok(Some(batch)) = rx.get() {
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    for packet in Packet::from_batch(&batch, now_ms()) {
                        match sink.publish(&packet) {
                            Ok(()) => published += 1,
                            Err(e) => log::warn!("Publisher {} dropped a packet: {}", thread_name, e),
                        }
                    }
                }
                log::info!("Publisher {} stopped, {} packets published", thread_name, published);
                published
            })?;

        Ok(Self {
            name: name.to_string(),
            channel,
            cancelled,
            thread: Some(thread),
        })
    }

    /// Stop the thread and return the number of packets it published.
    /// Batches still queued are discarded.
    pub fn cancel(&mut self) -> Result<u64> {
        let Some(thread) = self.thread.take() else {
            return Ok(0);
        };
        self.cancelled.store(true, Ordering::SeqCst);
        // a non-empty queue wakes the thread by itself
        self.channel.put_sentinel_if_empty()?;
        thread
            .join()
            .map_err(|_| SessionError::fatal(format!("publisher {} panicked", self.name)))
    }
}

impl Drop for ResultPublisher {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            log::error!("❌ Publisher {} shutdown failed: {}", self.name, e);
        }
    }
}
