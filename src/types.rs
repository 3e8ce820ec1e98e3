//! Core data types used across the trading system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Validation failure for a single candle
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) is below low ({low})")]
    HighBelowLow { high: f64, low: f64 },
    #[error("non-positive close price ({0})")]
    NonPositiveClose(f64),
    #[error("negative volume ({0})")]
    NegativeVolume(f64),
}

impl Candle {
    /// Construct a candle, rejecting inconsistent OHLCV values
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        if high < low {
            return Err(CandleValidationError::HighBelowLow { high, low });
        }
        if close <= 0.0 {
            return Err(CandleValidationError::NonPositiveClose(close));
        }
        if volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(volume));
        }
        Ok(Candle {
            datetime,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Trading pair symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Which extreme a range query looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    High,
    Low,
}

/// A local price extreme over an index range of the compressed series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub value: f64,
}

/// Price level produced by a confirmed A-B-C formation, held until
/// invalidated by later price action or consumed by an order.
///
/// `bc` is the length of the B-C retracement leg at scan time; the trading
/// model derives its price offsets from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingLevel {
    pub price: f64,
    pub bc: f64,
    pub side: Side,
    pub creation_bar: usize,
}

/// Entry/stop/profit levels derived from a pending level.
///
/// Immutable once built; a fresh instance is derived on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingModel {
    pub value: f64,
    pub enter_price: f64,
    pub stop_price: f64,
    pub profit_price: f64,
}

/// Per-bar buy/sell formation flags on the base series.
///
/// Write-once per bar, never cleared.
#[derive(Debug, Clone, Default)]
pub struct SignalMap {
    buy: Vec<bool>,
    sell: Vec<bool>,
}

impl SignalMap {
    pub fn new(len: usize) -> Self {
        SignalMap {
            buy: vec![false; len],
            sell: vec![false; len],
        }
    }

    pub fn mark(&mut self, side: Side, bar: usize) {
        let flags = match side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        };
        if let Some(flag) = flags.get_mut(bar) {
            *flag = true;
        }
    }

    pub fn is_buy(&self, bar: usize) -> bool {
        self.buy.get(bar).copied().unwrap_or(false)
    }

    pub fn is_sell(&self, bar: usize) -> bool {
        self.sell.get(bar).copied().unwrap_or(false)
    }

    pub fn buy_count(&self) -> usize {
        self.buy.iter().filter(|&&b| b).count()
    }

    pub fn sell_count(&self) -> usize {
        self.sell.iter().filter(|&&b| b).count()
    }
}

/// Completed trade record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pnl: f64,
    pub reason: String,
}

impl Trade {
    pub fn return_pct(&self) -> f64 {
        ((self.exit_price - self.entry_price) / self.entry_price) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_candle_validation() {
        let now = Utc::now();
        assert!(Candle::new(now, 100.0, 105.0, 95.0, 102.0, 10.0).is_ok());
        assert!(matches!(
            Candle::new(now, 100.0, 95.0, 105.0, 102.0, 10.0),
            Err(CandleValidationError::HighBelowLow { .. })
        ));
        assert!(matches!(
            Candle::new(now, 100.0, 105.0, 95.0, 0.0, 10.0),
            Err(CandleValidationError::NonPositiveClose(_))
        ));
        assert!(matches!(
            Candle::new(now, 100.0, 105.0, 95.0, 102.0, -1.0),
            Err(CandleValidationError::NegativeVolume(_))
        ));
    }

    #[test]
    fn test_signal_map_write_once() {
        let mut map = SignalMap::new(10);
        map.mark(Side::Buy, 3);
        map.mark(Side::Buy, 3);
        map.mark(Side::Sell, 7);

        assert!(map.is_buy(3));
        assert!(!map.is_buy(4));
        assert!(map.is_sell(7));
        assert_eq!(map.buy_count(), 1);
        assert_eq!(map.sell_count(), 1);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
