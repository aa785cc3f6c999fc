//! Trade processor (C5): drains the ingress ring, decodes each message,
//! and folds successfully decoded trades into the owning symbol's
//! sliding window.
//!
//! Grounded in `original_source/src/main.c`'s `trade_processor_thread_fn`:
//! pop, parse, on success append to the trade log and record latency,
//! on failure drop silently and move on.

use crate::decode::Decoder;
use crate::logs::{LatencyLog, TradeLog};
use crate::ring::{IngressRing, PopResult};
use crate::symbol::Symbol;
use std::sync::atomic::AtomicBool;

/// Runs until the ring reports `ShutdownEmpty`. Intended to be the body
/// of the dedicated trade-processor thread.
pub fn run(
    ring: &IngressRing,
    shutdown: &AtomicBool,
    decoder: &dyn Decoder,
    symbols: &[Symbol],
    symbol_names: &[String],
    trade_log: &TradeLog,
    latency_log: &LatencyLog,
) {
    loop {
        let message = match ring.pop(shutdown) {
            PopResult::Got(message) => message,
            PopResult::ShutdownEmpty => return,
        };

        match decoder.parse(message.raw_payload(), symbol_names) {
            Ok(trade) => {
                trade_log.append(trade.symbol_index, message.raw_payload());

                let process_ts_ms = crate::time::now_ms();
                latency_log.append(
                    trade.symbol_index,
                    trade.exchange_ts_ms,
                    message.receive_ts_ms,
                    process_ts_ms,
                );

                symbols[trade.symbol_index]
                    .window
                    .add_trade(trade.exchange_ts_ms, trade.price, trade.size);
            }
            Err(err) => {
                tracing::debug!(%err, "dropping undecodable trade message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::decode::okx::OkxDecoder;
    use crate::ring::RawTradeMessage;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    #[test]
    fn processes_valid_trade_and_drops_invalid_one() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.symbols = vec!["BTC-USDT".to_string()];
        settings.data_dir = dir.path().to_path_buf();
        crate::logs::ensure_data_dirs(&settings).unwrap();

        let symbols = crate::symbol::build_symbol_table(&settings);
        let ring = IngressRing::new(16);
        let shutdown = AtomicBool::new(false);

        let valid = br#"{"data":[{"instId":"BTC-USDT","px":"100.0","sz":"2.0","ts":"1000"}]}"#;
        let invalid = b"garbage, not json";
        ring.push(RawTradeMessage::from_payload(valid, 1_050).0);
        ring.push(RawTradeMessage::from_payload(invalid, 1_060).0);
        shutdown.store(true, Ordering::SeqCst);
        ring.notify_shutdown();

        let trade_log = TradeLog::new(&settings).unwrap();
        let latency_log = LatencyLog::new(&settings).unwrap();
        run(
            &ring,
            &shutdown,
            &OkxDecoder,
            &symbols,
            &settings.symbols,
            &trade_log,
            &latency_log,
        );

        assert!((symbols[0].window.snapshot_vwap() - 100.0).abs() < 1e-9);

        let contents = std::fs::read_to_string(settings.trades_dir().join("BTC-USDT.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
