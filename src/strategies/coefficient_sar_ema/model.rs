//! Trading model builder
//!
//! Derives entry, stop, and profit prices from a formation level. Each
//! offset maps the B-C leg length through a logarithm with its own base and
//! snaps the result to the price step. Reverse mode flips which side of the
//! level the stop and profit sit on; the entry offset sign never changes.

use serde::{Deserialize, Serialize};

use crate::types::{Side, TradingModel};

/// Execution variant, selected once per strategy instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Orders follow the nominal model side
    Normal,
    /// A triggered long model sells, a triggered short model buys
    Reverse,
}

/// Price-offset parameters of the trading model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelParams {
    pub multiply_delta: f64,
    pub multiply_profit: f64,
    pub multiply_stop: f64,
    pub divider: f64,
    pub price_step: f64,
    pub extra_delta: f64,
}

impl ModelParams {
    /// `round(log_base(bc / divider) / price_step) * price_step`
    pub fn price_offset(&self, bc: f64, log_base: f64) -> f64 {
        ((bc / self.divider).ln() / log_base.ln() / self.price_step).round() * self.price_step
    }
}

/// Build the model for a level price and its B-C leg length.
///
/// Sign assignment per (side, mode); `extra_delta` widens the entry offset
/// regardless of mode:
///
/// | side | mode    | enter     | stop  | profit |
/// |------|---------|-----------|-------|--------|
/// | Buy  | normal  | v - d - x | v - s | v + p  |
/// | Buy  | reverse | v - d - x | v + s | v - p  |
/// | Sell | normal  | v + d + x | v + s | v - p  |
/// | Sell | reverse | v + d + x | v - s | v + p  |
pub fn build_model(
    value: f64,
    bc: f64,
    side: Side,
    mode: ExecutionMode,
    params: &ModelParams,
) -> TradingModel {
    let delta = params.price_offset(bc, params.multiply_delta) + params.extra_delta;
    let stop = params.price_offset(bc, params.multiply_stop);
    let profit = params.price_offset(bc, params.multiply_profit);

    let (enter_price, stop_price, profit_price) = match (side, mode) {
        (Side::Buy, ExecutionMode::Normal) => (value - delta, value - stop, value + profit),
        (Side::Buy, ExecutionMode::Reverse) => (value - delta, value + stop, value - profit),
        (Side::Sell, ExecutionMode::Normal) => (value + delta, value + stop, value - profit),
        (Side::Sell, ExecutionMode::Reverse) => (value + delta, value - stop, value + profit),
    };

    TradingModel {
        value,
        enter_price,
        stop_price,
        profit_price,
    }
}
