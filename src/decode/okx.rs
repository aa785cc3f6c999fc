//! OKX `trades` channel push-message parser.
//!
//! Wire shape (see OKX's public WebSocket v5 docs):
//! ```json
//! {"arg":{"channel":"trades","instId":"BTC-USDT"},
//!  "data":[{"instId":"BTC-USDT","px":"42219.9","sz":"0.1206","ts":"1630048897897", ...}]}
//! ```
//! Only `data[0]` is consumed; OKX always sends one trade per `data`
//! entry for the public `trades` channel.

use super::{validate, Decoder, ParsedTrade};
use crate::error::DecodeError;
use serde::Deserialize;

#[derive(Deserialize)]
struct PushMessage {
    #[serde(default)]
    data: Vec<TradeData>,
}

#[derive(Deserialize)]
struct TradeData {
    #[serde(rename = "instId")]
    inst_id: String,
    px: String,
    sz: String,
    ts: String,
}

pub struct OkxDecoder;

impl Decoder for OkxDecoder {
    fn parse(&self, raw: &[u8], symbols: &[String]) -> Result<ParsedTrade, DecodeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| DecodeError::MalformedJson(e.to_string()))?;
        let message: PushMessage =
            serde_json::from_str(text).map_err(|e| DecodeError::MalformedJson(e.to_string()))?;
        let trade = message
            .data
            .into_iter()
            .next()
            .ok_or(DecodeError::MissingField("data"))?;

        let price: f64 = trade
            .px
            .parse()
            .map_err(|_| DecodeError::MalformedJson(format!("unparseable px: {}", trade.px)))?;
        let size: f64 = trade
            .sz
            .parse()
            .map_err(|_| DecodeError::MalformedJson(format!("unparseable sz: {}", trade.sz)))?;
        let exchange_ts_ms: i64 = trade
            .ts
            .parse()
            .map_err(|_| DecodeError::MalformedJson(format!("unparseable ts: {}", trade.ts)))?;

        validate(&trade.inst_id, symbols, exchange_ts_ms, price, size)
    }
}

/// OKX subscribe payload for every tracked symbol's public `trades`
/// channel, sent once per newly opened connection.
pub fn subscribe_payload(symbols: &[String]) -> String {
    let args: Vec<String> = symbols
        .iter()
        .map(|s| format!(r#"{{"channel":"trades","instId":"{s}"}}"#))
        .collect();
    format!(r#"{{"op":"subscribe","args":[{}]}}"#, args.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<String> {
        vec!["BTC-USDT".to_string(), "ETH-USDT".to_string()]
    }

    #[test]
    fn parses_well_formed_trade_push() {
        let raw = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},
            "data":[{"instId":"BTC-USDT","tradeId":"1","px":"42219.9","sz":"0.12","side":"buy","ts":"1630048897897"}]}"#;
        let parsed = OkxDecoder.parse(raw, &symbols()).unwrap();
        assert_eq!(parsed.symbol_index, 0);
        assert_eq!(parsed.exchange_ts_ms, 1_630_048_897_897);
        assert!((parsed.price - 42219.9).abs() < 1e-9);
        assert!((parsed.size - 0.12).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_json() {
        let raw = b"not json";
        assert!(matches!(
            OkxDecoder.parse(raw, &symbols()).unwrap_err(),
            DecodeError::MalformedJson(_)
        ));
    }

    #[test]
    fn rejects_message_with_no_data() {
        let raw = br#"{"arg":{"channel":"trades","instId":"BTC-USDT"},"data":[]}"#;
        assert!(matches!(
            OkxDecoder.parse(raw, &symbols()).unwrap_err(),
            DecodeError::MissingField("data")
        ));
    }

    #[test]
    fn rejects_unknown_symbol() {
        let raw = br#"{"data":[{"instId":"DOGE-USDT","px":"1.0","sz":"1.0","ts":"1"}]}"#;
        assert!(matches!(
            OkxDecoder.parse(raw, &symbols()).unwrap_err(),
            DecodeError::UnknownSymbol(_)
        ));
    }

    #[test]
    fn subscribe_payload_lists_every_symbol() {
        let payload = subscribe_payload(&symbols());
        assert!(payload.contains("BTC-USDT"));
        assert!(payload.contains("ETH-USDT"));
        assert!(payload.starts_with(r#"{"op":"subscribe""#));
    }
}
