//! Exchange WebSocket transport (A3).
//!
//! Runs on a dedicated OS thread driving its own current-thread Tokio
//! runtime, the way `terrylica-rangebar` isolates its async streaming
//! path from the rest of a binary's control flow. Everything downstream
//! of the ring (processor, VWAP/correlation workers, scheduler) stays
//! on plain `std::thread`.

pub mod okx;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared handle used to cancel the transport from the shutdown path
/// and to observe how many oversized frames it has truncated.
pub struct TransportHandle {
    cancelled: AtomicBool,
    truncated_count: AtomicU64,
}

impl TransportHandle {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            truncated_count: AtomicU64::new(0),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn record_truncation(&self) {
        self.truncated_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of raw frames truncated at `RAW_PAYLOAD_CAPACITY` since
    /// startup (spec §9: truncation is soft — the message is still
    /// enqueued and will likely fail decoding, but is counted here).
    pub fn truncated_count(&self) -> u64 {
        self.truncated_count.load(Ordering::Relaxed)
    }
}

impl Default for TransportHandle {
    fn default() -> Self {
        Self::new()
    }
}
