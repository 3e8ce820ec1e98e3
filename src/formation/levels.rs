//! Pending-level book
//!
//! Owns the per-side lists of pending levels between period boundaries. The
//! scanner rebuilds a side wholesale on every boundary bar; in between, each
//! bar re-validates the surviving levels against base-series price action
//! since the boundary and drops the invalidated ones permanently.

use tracing::debug;

use crate::series::SeriesPair;
use crate::types::{Extreme, PendingLevel, Side};

#[derive(Debug, Clone, Default)]
pub struct LevelBook {
    buy: Vec<PendingLevel>,
    sell: Vec<PendingLevel>,
}

impl LevelBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one side's levels with a fresh scan result
    pub fn rebuild(&mut self, side: Side, levels: Vec<PendingLevel>) {
        match side {
            Side::Buy => self.buy = levels,
            Side::Sell => self.sell = levels,
        }
    }

    /// Drop levels invalidated by price action since the last period boundary.
    ///
    /// A buy level survives only while the base-series high since the
    /// boundary stays more than `scope_delta` below it; sell levels mirrored
    /// against the low. Dropped levels are never reinstated. Calling this
    /// twice on the same bar is a no-op the second time.
    pub fn validate(&mut self, series: &SeriesPair, bar: usize, scope_delta: f64) {
        let before = self.buy.len() + self.sell.len();

        let last_max = extreme_since_period_start(series, bar, Extreme::High);
        self.buy.retain(|level| level.price - scope_delta > last_max);

        let last_min = extreme_since_period_start(series, bar, Extreme::Low);
        self.sell.retain(|level| level.price + scope_delta < last_min);

        let dropped = before - self.buy.len() - self.sell.len();
        if dropped > 0 {
            debug!(bar, dropped, "pending levels invalidated");
        }
    }

    pub fn buy(&self) -> &[PendingLevel] {
        &self.buy
    }

    pub fn sell(&self) -> &[PendingLevel] {
        &self.sell
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }
}

/// Base-series extreme from `bar` backward to (but not including) the most
/// recent period-boundary bar.
///
/// On a boundary bar the window is empty and the identity value is returned,
/// so every level survives validation there.
pub fn extreme_since_period_start(series: &SeriesPair, bar: usize, extreme: Extreme) -> f64 {
    let mut value = match extreme {
        Extreme::High => f64::NEG_INFINITY,
        Extreme::Low => f64::INFINITY,
    };

    let mut i = bar;
    loop {
        if series.is_period_start(i) {
            break;
        }
        let candle = &series.base()[i];
        value = match extreme {
            Extreme::High => value.max(candle.high),
            Extreme::Low => value.min(candle.low),
        };
        if i == 0 {
            break;
        }
        i -= 1;
    }

    value
}
