//! Bounded ingress ring (C2): a drop-oldest, single-consumer queue of raw
//! trade messages shared between the transport thread(s) and the trade
//! processor.
//!
//! Grounded in `original_source/src/data/queue.c`'s `raw_trade_queue`:
//! one mutex, one condvar, `capacity - 1` usable slots (the ring
//! distinguishes full from empty by always leaving one slot unused).

use crate::config::RAW_PAYLOAD_CAPACITY;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

/// A raw trade message as captured at the transport boundary, before
/// decoding. Immutable once enqueued (spec §3).
#[derive(Clone)]
pub struct RawTradeMessage {
    /// Resolved by the decoder; `None` until then.
    pub symbol_index: Option<usize>,
    pub exchange_ts_ms: i64,
    pub price: f64,
    pub size: f64,
    /// Up to `RAW_PAYLOAD_CAPACITY` bytes of the original frame. Longer
    /// frames are truncated deterministically at the byte boundary.
    raw_payload: [u8; RAW_PAYLOAD_CAPACITY],
    raw_payload_len: usize,
    pub receive_ts_ms: i64,
}

impl RawTradeMessage {
    /// Builds a message from an arbitrary-length payload, truncating at
    /// `RAW_PAYLOAD_CAPACITY` bytes. Returns whether truncation occurred,
    /// so callers can maintain a truncation counter (spec §9).
    pub fn from_payload(payload: &[u8], receive_ts_ms: i64) -> (Self, bool) {
        let mut buf = [0u8; RAW_PAYLOAD_CAPACITY];
        let truncated = payload.len() > RAW_PAYLOAD_CAPACITY;
        let copy_len = payload.len().min(RAW_PAYLOAD_CAPACITY);
        buf[..copy_len].copy_from_slice(&payload[..copy_len]);
        (
            Self {
                symbol_index: None,
                exchange_ts_ms: 0,
                price: 0.0,
                size: 0.0,
                raw_payload: buf,
                raw_payload_len: copy_len,
                receive_ts_ms,
            },
            truncated,
        )
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            symbol_index: None,
            exchange_ts_ms: 0,
            price: 0.0,
            size: 0.0,
            raw_payload: [0u8; RAW_PAYLOAD_CAPACITY],
            raw_payload_len: 0,
            receive_ts_ms: 0,
        }
    }

    pub fn raw_payload(&self) -> &[u8] {
        &self.raw_payload[..self.raw_payload_len]
    }
}

/// Result of a blocking [`IngressRing::pop`].
pub enum PopResult {
    Got(RawTradeMessage),
    ShutdownEmpty,
}

struct RingState {
    buffer: Vec<RawTradeMessage>,
    capacity: usize,
    head: usize,
    tail: usize,
}

impl RingState {
    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        (self.tail + 1) % self.capacity == self.head
    }
}

/// Bounded MPSC ring: any number of producers call [`push`](Self::push),
/// a single consumer calls [`pop`](Self::pop).
pub struct IngressRing {
    state: Mutex<RingState>,
    not_empty: Condvar,
}

impl IngressRing {
    /// `capacity` is `Q`; one slot is reserved, so `capacity - 1` messages
    /// can be buffered at once. Allocation happens once, at startup.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring capacity must allow at least one slot");
        let buffer = vec![RawTradeMessage::from_payload(&[], 0).0; capacity];
        Self {
            state: Mutex::new(RingState {
                buffer,
                capacity,
                head: 0,
                tail: 0,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Never blocks, never fails. Drops the oldest message(s) to make
    /// room if the ring is full, then stores `msg` and wakes one waiter.
    pub fn push(&self, msg: RawTradeMessage) {
        let mut state = self.state.lock().expect("ingress ring mutex poisoned");
        while state.is_full() {
            state.head = (state.head + 1) % state.capacity;
        }
        let tail = state.tail;
        state.buffer[tail] = msg;
        state.tail = (tail + 1) % state.capacity;
        drop(state);
        self.not_empty.notify_one();
    }

    /// Blocks while the ring is empty and `shutdown` is not set. Returns
    /// [`PopResult::ShutdownEmpty`] once the ring has drained after
    /// shutdown was requested.
    pub fn pop(&self, shutdown: &AtomicBool) -> PopResult {
        let mut state = self.state.lock().expect("ingress ring mutex poisoned");
        while state.is_empty() && !shutdown.load(Ordering::SeqCst) {
            state = self
                .not_empty
                .wait(state)
                .expect("ingress ring condvar poisoned");
        }
        if state.is_empty() {
            return PopResult::ShutdownEmpty;
        }
        let head = state.head;
        let msg = state.buffer[head].clone();
        state.head = (head + 1) % state.capacity;
        PopResult::Got(msg)
    }

    /// Wakes any thread blocked in [`pop`](Self::pop) so it can observe a
    /// shutdown request. Called by the shutdown handler.
    pub fn notify_shutdown(&self) {
        self.not_empty.notify_all();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap();
        (state.tail + state.capacity - state.head) % state.capacity
    }
}
