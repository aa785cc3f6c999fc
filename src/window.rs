//! Per-symbol sliding window (C3): a circular buffer of recent trades
//! with incremental VWAP running sums.
//!
//! Grounded in `original_source/src/data/sliding_window.c`.

use crate::config::WINDOW_MS;
use std::sync::Mutex;

/// A trade as stored inside the sliding window (spec §3). Never shared
/// outside the window.
#[derive(Clone, Copy, Debug)]
struct ProcessedTrade {
    trade_ts_ms: i64,
    price: f64,
    size: f64,
}

struct WindowState {
    buffer: Vec<ProcessedTrade>,
    capacity: usize,
    head: usize,
    tail: usize,
    size: usize,
    sum_pv: f64,
    sum_v: f64,
}

/// Bounded-duration (`W` = 15 min) view of the most recent trades for one
/// symbol, maintained with incremental running sums for O(1) VWAP reads.
pub struct SlidingWindow {
    state: Mutex<WindowState>,
}

impl SlidingWindow {
    /// Preallocates the full `capacity` (`K`) at construction; no growth
    /// or reallocation happens afterward.
    pub fn new(capacity: usize) -> Self {
        let filler = ProcessedTrade {
            trade_ts_ms: 0,
            price: 0.0,
            size: 0.0,
        };
        Self {
            state: Mutex::new(WindowState {
                buffer: vec![filler; capacity],
                capacity,
                head: 0,
                tail: 0,
                size: 0,
                sum_pv: 0.0,
                sum_v: 0.0,
            }),
        }
    }

    /// Adds one trade, atomic with respect to concurrent snapshots.
    ///
    /// Order of operations (spec §4.C3):
    /// 1. prune entries older than `ts_ms - W`, using the *new* trade's
    ///    timestamp as "now" — this anchors the window to the newest
    ///    trade even under out-of-order or late prints;
    /// 2. evict the oldest entry if the buffer is at capacity;
    /// 3. append the new trade and update the running sums.
    pub fn add_trade(&self, ts_ms: i64, price: f64, size: f64) {
        let mut s = self.state.lock().expect("sliding window mutex poisoned");

        let expiry_cutoff_ms = ts_ms - WINDOW_MS;
        while s.size > 0 && s.buffer[s.head].trade_ts_ms < expiry_cutoff_ms {
            let head = s.head;
            s.sum_pv -= s.buffer[head].price * s.buffer[head].size;
            s.sum_v -= s.buffer[head].size;
            s.head = (head + 1) % s.capacity;
            s.size -= 1;
        }

        if s.size == s.capacity {
            let head = s.head;
            s.sum_pv -= s.buffer[head].price * s.buffer[head].size;
            s.sum_v -= s.buffer[head].size;
            s.head = (head + 1) % s.capacity;
            s.size -= 1;
        }

        let tail = s.tail;
        s.buffer[tail] = ProcessedTrade {
            trade_ts_ms: ts_ms,
            price,
            size,
        };
        s.tail = (tail + 1) % s.capacity;
        s.size += 1;

        s.sum_pv += price * size;
        s.sum_v += size;
    }

    /// `sum_pv / sum_v`, or NaN if no live trades. O(1).
    pub fn snapshot_vwap(&self) -> f64 {
        let s = self.state.lock().expect("sliding window mutex poisoned");
        if s.sum_v > 0.0 {
            s.sum_pv / s.sum_v
        } else {
            f64::NAN
        }
    }

    #[cfg(test)]
    fn sums(&self) -> (f64, f64) {
        let s = self.state.lock().unwrap();
        (s.sum_pv, s.sum_v)
    }

    #[cfg(test)]
    fn live_timestamps(&self) -> Vec<i64> {
        let s = self.state.lock().unwrap();
        let mut out = Vec::with_capacity(s.size);
        let mut idx = s.head;
        for _ in 0..s.size {
            out.push(s.buffer[idx].trade_ts_ms);
            idx = (idx + 1) % s.capacity;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S1 — single symbol steady VWAP.
    #[test]
    fn steady_vwap_s1() {
        let w = SlidingWindow::new(50_000);
        w.add_trade(1000, 100.0, 1.0);
        w.add_trade(2000, 200.0, 1.0);
        w.add_trade(3000, 300.0, 2.0);
        assert!((w.snapshot_vwap() - 225.0).abs() < 1e-9);
    }

    /// S2 — expiry prunes the oldest entry once it falls outside `W`.
    #[test]
    fn expiry_prunes_oldest_s2() {
        let w = SlidingWindow::new(50_000);
        w.add_trade(0, 100.0, 1.0);
        w.add_trade(WINDOW_MS, 200.0, 1.0);
        w.add_trade(WINDOW_MS + 1, 300.0, 1.0);

        let (sum_pv, sum_v) = w.sums();
        assert!((sum_v - 2.0).abs() < 1e-9);
        assert!((sum_pv - 500.0).abs() < 1e-9);
        assert!((w.snapshot_vwap() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn empty_window_vwap_is_nan() {
        let w = SlidingWindow::new(10);
        assert!(w.snapshot_vwap().is_nan());
    }

    /// VWAP idempotence: adding the same trade twice doubles its
    /// contribution; expiring both returns the sums to their pre-insert
    /// state (within floating point tolerance).
    #[test]
    fn idempotence_law() {
        let w = SlidingWindow::new(10);
        w.add_trade(1000, 50.0, 2.0);
        let (pv1, v1) = w.sums();

        w.add_trade(1000, 50.0, 2.0);
        let (pv2, v2) = w.sums();
        assert!((pv2 - 2.0 * pv1).abs() < 1e-9);
        assert!((v2 - 2.0 * v1).abs() < 1e-9);

        // Force both out of window by adding a trade far enough in the future.
        w.add_trade(1000 + WINDOW_MS + 1, 1.0, 1.0);
        let (pv3, v3) = w.sums();
        assert!((pv3 - 1.0).abs() < 1e-9);
        assert!((v3 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overflow_evicts_head_at_capacity() {
        let w = SlidingWindow::new(3);
        w.add_trade(1000, 1.0, 1.0);
        w.add_trade(1001, 2.0, 1.0);
        w.add_trade(1002, 3.0, 1.0);
        w.add_trade(1003, 4.0, 1.0);
        assert_eq!(w.live_timestamps(), vec![1001, 1002, 1003]);
    }

    #[test]
    fn late_trade_is_appended_then_pruned_on_next_add() {
        let w = SlidingWindow::new(10);
        w.add_trade(10_000_000, 10.0, 1.0);
        // Late trade, already older than (newest - W) at insertion time.
        w.add_trade(0, 1.0, 1.0);
        assert_eq!(w.live_timestamps().len(), 2);

        // Next add anchors pruning to its own timestamp; both old entries expire.
        w.add_trade(10_000_000 + WINDOW_MS + 1, 20.0, 1.0);
        assert_eq!(w.live_timestamps(), vec![10_000_000 + WINDOW_MS + 1]);
    }
}
