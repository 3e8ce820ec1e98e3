//! Core OMS types
//!
//! Orders, open positions, and related identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Side, Symbol, TradingModel};

/// Order ID type - u64 for performance
pub type OrderId = u64;

/// Atomic counter for fast order ID generation
static ORDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate next order ID (thread-safe, lock-free)
pub fn next_order_id() -> OrderId {
    ORDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Order type - determines trigger logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Stop entry: buy triggers when price rises to the order price,
    /// sell triggers when price falls to it
    Stop,

    /// At-price entry: buy fills when price falls to the order price,
    /// sell fills when price rises to it
    Limit,
}

/// Conditional entry order.
///
/// Orders are valid for exactly one bar after submission; a surviving level
/// re-submits every bar, and re-submission under the same tag replaces the
/// previous order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: f64,
    pub quantity: f64,
    /// Formation level the order originates from
    pub level_price: f64,
    /// Trading model carried onto the position when the order fills
    pub model: Option<TradingModel>,
    pub tag: String,
    pub submitted_bar: usize,
    pub created_at: DateTime<Utc>,
}

/// Exit instruction attached to an open position for the next bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitOrder {
    pub price: f64,
    pub tag: String,
}

/// Open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub entry_price: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_bar: usize,
    /// Formation level the entry originated from
    pub level_price: f64,
    /// Trading model captured at entry, if the strategy uses one
    pub model: Option<TradingModel>,
    pub tag: String,
    /// Stop exit for the next bar; cleared after each bar
    pub stop_exit: Option<ExitOrder>,
    /// Profit exit for the next bar; cleared after each bar
    pub profit_exit: Option<ExitOrder>,
}

impl Position {
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        match self.side {
            Side::Buy => (current_price - self.entry_price) * self.quantity,
            Side::Sell => (self.entry_price - current_price) * self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_generation() {
        let id1 = next_order_id();
        let id2 = next_order_id();
        assert!(id2 > id1);
    }

    #[test]
    fn test_position_unrealized_pnl() {
        let position = Position {
            id: 1,
            symbol: Symbol::new("RTS"),
            side: Side::Buy,
            entry_price: 155.0,
            quantity: 2.0,
            entry_time: Utc::now(),
            entry_bar: 10,
            level_price: 160.0,
            model: None,
            tag: "buy_160".to_string(),
            stop_exit: None,
            profit_exit: None,
        };

        assert_eq!(position.unrealized_pnl(160.0), 10.0);

        let short = Position {
            side: Side::Sell,
            ..position
        };
        assert_eq!(short.unrealized_pnl(150.0), 10.0);
    }
}
