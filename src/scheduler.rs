//! Drift-compensating minute-aligned scheduler (C8).
//!
//! Grounded in `original_source/src/scheduler/scheduler.c`: an
//! exponential moving average of recent work duration is used to wake
//! up early enough that the two compute workers finish *at* the minute
//! boundary rather than starting there, while an absolute (not
//! relative) wakeup clock prevents drift from compounding across ticks.

use crate::barrier::TwoPhaseBarrier;
use crate::logs::{SchedulerLog, SystemLog};
use crate::monitor::SystemMonitor;
use crate::time::now_monotonic_ns;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

/// One minute, in nanoseconds.
const PERIOD_NS: i64 = 60_000_000_000;
/// EMA smoothing factor for predicted work duration.
const EMA_ALPHA: f64 = 0.2;
/// Upper clamp on predicted work duration: never wake up more than
/// 100ms early no matter how slow a previous tick ran.
const MAX_PREDICTED_NS: f64 = 100_000_000.0;
/// Longest single sleep slice, so a shutdown request during a long wait
/// is noticed promptly instead of only after the full sleep elapses.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Drives the two compute workers (VWAP, correlation) once per minute
/// via a pair of barriers, and owns the scheduling/metrics logging that
/// wraps each tick.
pub struct Scheduler<'a> {
    start_barrier: &'a TwoPhaseBarrier,
    done_barrier: &'a TwoPhaseBarrier,
    shutdown: &'a AtomicBool,
    current_minute_ms: &'a AtomicI64,
    scheduler_log: &'a SchedulerLog,
    system_log: &'a SystemLog,
    monitor: SystemMonitor,
    predicted_duration_ns: f64,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        start_barrier: &'a TwoPhaseBarrier,
        done_barrier: &'a TwoPhaseBarrier,
        shutdown: &'a AtomicBool,
        current_minute_ms: &'a AtomicI64,
        scheduler_log: &'a SchedulerLog,
        system_log: &'a SystemLog,
    ) -> Self {
        Self {
            start_barrier,
            done_barrier,
            shutdown,
            current_minute_ms,
            scheduler_log,
            system_log,
            monitor: SystemMonitor::new(),
            predicted_duration_ns: 0.0,
        }
    }

    /// Runs ticks until shutdown is requested, then crosses both
    /// barriers once more so the two workers, parked waiting for this
    /// thread, can observe shutdown and exit.
    pub fn run(&mut self) {
        let mut scheduled_ns = next_minute_boundary_ns(now_monotonic_ns());

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                self.start_barrier.wait();
                self.done_barrier.wait();
                return;
            }

            let now = now_monotonic_ns();
            while scheduled_ns <= now {
                scheduled_ns += PERIOD_NS;
            }

            let target_wakeup_ns = scheduled_ns - self.predicted_duration_ns.round() as i64;
            if target_wakeup_ns <= now_monotonic_ns() {
                tracing::warn!(scheduled_ns, "missed schedule window, executing immediately");
            } else {
                self.sleep_until(target_wakeup_ns);
            }

            if self.shutdown.load(Ordering::SeqCst) {
                self.start_barrier.wait();
                self.done_barrier.wait();
                return;
            }

            // Workers need a wall-clock minute stamp (spec §4.C8, §3's
            // `VwapPoint.minute_ts_ms` is UTC ms) — `scheduled_ns` is
            // monotonic and only meaningful as a scheduling clock, not a
            // timestamp to persist.
            let minute_ms = crate::time::floor_to_minute_ms(crate::time::now_ms());
            self.current_minute_ms.store(minute_ms, Ordering::SeqCst);

            let work_start_ns = now_monotonic_ns();
            self.start_barrier.wait();
            self.done_barrier.wait();
            let work_end_ns = now_monotonic_ns();

            let work_duration_ns = (work_end_ns - work_start_ns) as f64;
            self.predicted_duration_ns =
                (EMA_ALPHA * work_duration_ns + (1.0 - EMA_ALPHA) * self.predicted_duration_ns)
                    .clamp(0.0, MAX_PREDICTED_NS);

            let drift_ns = (work_end_ns - scheduled_ns) as f64;
            self.scheduler_log.append(
                scheduled_ns / 1_000_000,
                work_end_ns / 1_000_000,
                drift_ns / 1_000_000.0,
            );

            let (cpu_percent, memory_mb) = self.monitor.sample();
            self.system_log
                .append(crate::time::now_ms(), cpu_percent, memory_mb);

            scheduled_ns += PERIOD_NS;
        }
    }

    fn sleep_until(&self, target_ns: i64) {
        loop {
            let now = now_monotonic_ns();
            if now >= target_ns || self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            let remaining = Duration::from_nanos((target_ns - now) as u64);
            std::thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

fn next_minute_boundary_ns(now_ns: i64) -> i64 {
    let remainder = now_ns % PERIOD_NS;
    if remainder == 0 {
        now_ns + PERIOD_NS
    } else {
        now_ns + (PERIOD_NS - remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_boundary_is_always_in_the_future() {
        let now = now_monotonic_ns();
        let boundary = next_minute_boundary_ns(now);
        assert!(boundary > now);
        assert!(boundary - now <= PERIOD_NS);
    }

    #[test]
    fn ema_clamps_to_nonnegative_and_cap() {
        let mut predicted = 0.0_f64;
        for duration_ns in [0.0, 1e9, -1.0] {
            predicted = (EMA_ALPHA * duration_ns + (1.0 - EMA_ALPHA) * predicted)
                .clamp(0.0, MAX_PREDICTED_NS);
            assert!((0.0..=MAX_PREDICTED_NS).contains(&predicted));
        }
    }
}
