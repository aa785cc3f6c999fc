//! Compile-time constants (spec §6) exposed as a runtime `Settings` value.
//!
//! Every field here has a default matching the specification's
//! configuration table. Tests parameterize a `Settings` directly; the CLI
//! (`src/bin/okx_processor.rs`) builds one from `clap` flags.

use std::path::PathBuf;

/// Sliding-window duration, in minutes (`W_MIN`).
pub const WINDOW_MINUTES: i64 = 15;

/// Sliding-window duration, in milliseconds (`W`).
pub const WINDOW_MS: i64 = WINDOW_MINUTES * 60 * 1000;

/// Points per correlation vector (`P`).
pub const CORRELATION_POINTS: usize = 8;

/// Maximum correlation lag, in minutes (`MAX_LAG_MIN`).
pub const MAX_LAG_MINUTES: usize = 60;

/// VWAP-history capacity per symbol (`H = P + MAX_LAG_MIN`).
pub const VWAP_HISTORY_CAPACITY: usize = CORRELATION_POINTS + MAX_LAG_MINUTES;

/// Bytes of raw payload retained per message (`P` in the data model, not
/// to be confused with `CORRELATION_POINTS` above — the spec overloads
/// the letter for two different quantities).
pub const RAW_PAYLOAD_CAPACITY: usize = 1024;

/// Default tracked symbols, in OKX `instId` form (`original_source/src/config.h`).
pub const DEFAULT_SYMBOLS: [&str; 8] = [
    "BTC-USDT",
    "ADA-USDT",
    "ETH-USDT",
    "DOGE-USDT",
    "XRP-USDT",
    "SOL-USDT",
    "LTC-USDT",
    "BNB-USDT",
];

/// Runtime configuration for one engine instance.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Tracked symbol names, index-stable for the lifetime of the process.
    pub symbols: Vec<String>,
    /// Ingress ring capacity (`Q`). One slot is always reserved, so the
    /// effective number of buffered messages is `ring_capacity - 1`.
    pub ring_capacity: usize,
    /// Sliding-window capacity per symbol, in trades (`K`).
    pub window_capacity: usize,
    /// fsync() after every append-only write. Off by default; durability
    /// vs. throughput trade-off per spec §6.
    pub fsync_per_write: bool,
    /// Root directory for all output files.
    pub data_dir: PathBuf,
    /// Bounded retry count for the transport's reconnect/backoff policy.
    pub transport_max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            ring_capacity: 1024,
            window_capacity: 50_000,
            fsync_per_write: false,
            data_dir: PathBuf::from("data"),
            transport_max_retries: 10,
        }
    }
}

impl Settings {
    /// Number of tracked symbols (`N`).
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn trades_dir(&self) -> PathBuf {
        self.data_dir.join("trades")
    }

    pub fn vwap_dir(&self) -> PathBuf {
        self.data_dir.join("metrics").join("vwap")
    }

    pub fn correlation_dir(&self) -> PathBuf {
        self.data_dir.join("metrics").join("correlations")
    }

    pub fn performance_dir(&self) -> PathBuf {
        self.data_dir.join("performance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let s = Settings::default();
        assert_eq!(s.symbol_count(), 8);
        assert_eq!(s.ring_capacity, 1024);
        assert_eq!(s.window_capacity, 50_000);
        assert_eq!(WINDOW_MINUTES, 15);
        assert_eq!(CORRELATION_POINTS, 8);
        assert_eq!(MAX_LAG_MINUTES, 60);
        assert_eq!(VWAP_HISTORY_CAPACITY, 68);
        assert!(!s.fsync_per_write);
    }
}
