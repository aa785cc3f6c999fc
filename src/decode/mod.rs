//! Raw payload decoding (A4): turns an exchange-specific wire frame into
//! a validated, symbol-resolved trade.
//!
//! One decoder per transport lives under this module; [`okx`] is the
//! only one wired up today, matching `original_source/src/network/okx_parser.c`.

pub mod okx;

use crate::error::DecodeError;

/// A trade fully parsed and validated against the symbol table, ready
/// to feed the sliding window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedTrade {
    pub symbol_index: usize,
    pub exchange_ts_ms: i64,
    pub price: f64,
    pub size: f64,
}

/// Implemented by one parser per upstream exchange protocol.
pub trait Decoder {
    fn parse(&self, raw: &[u8], symbols: &[String]) -> Result<ParsedTrade, DecodeError>;
}

/// Shared validation every decoder applies once it has extracted the
/// raw fields (spec §7(c)): symbol must be tracked, price and size must
/// be strictly positive.
pub(crate) fn validate(
    symbol_name: &str,
    symbols: &[String],
    exchange_ts_ms: i64,
    price: f64,
    size: f64,
) -> Result<ParsedTrade, DecodeError> {
    let symbol_index = symbols
        .iter()
        .position(|s| s == symbol_name)
        .ok_or_else(|| DecodeError::UnknownSymbol(symbol_name.to_string()))?;
    if !(price > 0.0) {
        return Err(DecodeError::NonPositivePrice(price));
    }
    if !(size > 0.0) {
        return Err(DecodeError::NonPositiveSize(size));
    }
    Ok(ParsedTrade {
        symbol_index,
        exchange_ts_ms,
        price,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_unknown_symbol() {
        let symbols = vec!["BTC-USDT".to_string()];
        let err = validate("ETH-USDT", &symbols, 0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSymbol(_)));
    }

    #[test]
    fn validate_rejects_non_positive_price_and_size() {
        let symbols = vec!["BTC-USDT".to_string()];
        assert!(matches!(
            validate("BTC-USDT", &symbols, 0, 0.0, 1.0).unwrap_err(),
            DecodeError::NonPositivePrice(_)
        ));
        assert!(matches!(
            validate("BTC-USDT", &symbols, 0, 1.0, -1.0).unwrap_err(),
            DecodeError::NonPositiveSize(_)
        ));
    }

    #[test]
    fn validate_accepts_well_formed_trade() {
        let symbols = vec!["BTC-USDT".to_string(), "ETH-USDT".to_string()];
        let parsed = validate("ETH-USDT", &symbols, 12_345, 2500.5, 0.1).unwrap();
        assert_eq!(parsed.symbol_index, 1);
        assert_eq!(parsed.exchange_ts_ms, 12_345);
    }
}
