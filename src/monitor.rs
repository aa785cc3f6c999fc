//! Host resource sampling (A5): process CPU% and resident memory.
//!
//! `original_source/src/utils/system_monitor.c` computes CPU usage from
//! `CLOCK_PROCESS_CPUTIME_ID` and parses `VmRSS` out of
//! `/proc/self/status` by hand. That's exactly the job the `sysinfo`
//! crate does portably; grounded in `cooprefr-bettersys`'s
//! `src/performance/memory.rs`, which already reaches for `sysinfo` for
//! the same purpose.

use std::time::Instant;
use sysinfo::{Pid, System};

/// Samples this process's CPU% and RSS once per call. CPU% is relative
/// to the time elapsed since the previous sample (or since
/// construction, for the first call) — matching the "since last probe"
/// semantics of the C implementation rather than sysinfo's own
/// refresh-interval default.
pub struct SystemMonitor {
    system: System,
    pid: Pid,
    last_sample: Instant,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        system.refresh_process(pid);
        Self {
            system,
            pid,
            last_sample: Instant::now(),
        }
    }

    /// Returns `(cpu_percent, memory_mb)`. `cpu_percent` is `0.0` on the
    /// very first call, matching `cpu_usage_percent_since`'s behavior
    /// before any elapsed time has accumulated.
    pub fn sample(&mut self) -> (f64, f64) {
        self.system.refresh_process(self.pid);
        let elapsed = self.last_sample.elapsed();
        self.last_sample = Instant::now();

        let cpu_percent = if elapsed.as_secs_f64() > 0.0 {
            self.system
                .process(self.pid)
                .map(|p| p.cpu_usage() as f64)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let memory_mb = self
            .system
            .process(self.pid)
            .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);

        (cpu_percent, memory_mb)
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}
