//! Per-minute VWAP worker (C6).
//!
//! Grounded in `original_source/src/compute/vwap_calculator.c`'s
//! `vwap_worker_fn`: for every symbol, snapshot the sliding window's
//! running VWAP, append it to that symbol's history, and log it.

use crate::logs::VwapLog;
use crate::symbol::Symbol;

/// Runs one tick of the VWAP worker across every tracked symbol.
/// Called by the scheduler once per minute, between the two barrier
/// waits.
pub fn tick(symbols: &[Symbol], current_minute_ms: i64, vwap_log: &VwapLog) {
    for (index, symbol) in symbols.iter().enumerate() {
        let vwap = symbol.window.snapshot_vwap();
        symbol.history.append(current_minute_ms, vwap);
        vwap_log.append(index, current_minute_ms, vwap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use tempfile::tempdir;

    #[test]
    fn tick_appends_history_and_writes_log() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.symbols = vec!["BTC-USDT".into()];
        settings.data_dir = dir.path().to_path_buf();
        crate::logs::ensure_data_dirs(&settings).unwrap();

        let symbols = crate::symbol::build_symbol_table(&settings);
        symbols[0].window.add_trade(1_000, 100.0, 1.0);
        symbols[0].window.add_trade(2_000, 200.0, 1.0);

        let log = VwapLog::new(&settings).unwrap();
        tick(&symbols, 60_000, &log);

        assert_eq!(symbols[0].history.len(), 1);
        let contents = std::fs::read_to_string(settings.vwap_dir().join("BTC-USDT.csv")).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
