//! Formation scanner
//!
//! Walks candidate start indices backward from the current compressed bar to
//! the first bar of the trading day and searches each sub-range for an A-B-C
//! swing triple. A qualifying triple yields a pending level at the B price.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::series::{find_extreme, slice_extreme};
use crate::types::{Candle, Extreme, PendingLevel, Side};

/// Geometric bounds of the formation search.
///
/// `length_segment_ab` bounds the A-B impulse leg from above while
/// `length_segment_bc` bounds both legs from below; the names deliberately
/// bound different legs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FormationParams {
    pub length_segment_ab: f64,
    pub length_segment_bc: f64,
    pub scope_delta: f64,
}

impl FormationParams {
    /// A lower bound at or above the upper bound can never be satisfied;
    /// such a configuration silently yields zero formations.
    pub fn is_degenerate(&self) -> bool {
        self.length_segment_bc >= self.length_segment_ab
    }
}

/// Scan one side for formations ending at the current compressed bar.
///
/// `current` is the index of the compressed bar containing the bar being
/// evaluated, `day_start` the index of the first compressed bar of its
/// trading day, and `creation_bar` the base-series index stamped onto the
/// emitted levels. Levels come back in scan order (start index descending).
pub fn scan(
    compressed: &[Candle],
    current: usize,
    day_start: usize,
    side: Side,
    params: &FormationParams,
    creation_bar: usize,
) -> Vec<PendingLevel> {
    match side {
        Side::Buy => scan_buy(compressed, current, day_start, params, creation_bar),
        Side::Sell => scan_sell(compressed, current, day_start, params, creation_bar),
    }
}

fn scan_buy(
    compressed: &[Candle],
    current: usize,
    day_start: usize,
    params: &FormationParams,
    creation_bar: usize,
) -> Vec<PendingLevel> {
    let mut levels = Vec::new();

    for start in (day_start..current).rev() {
        let point_b = find_extreme(compressed, start, current, Extreme::High);
        let point_a = find_extreme(compressed, start, point_b.index, Extreme::Low);

        // A and B cannot share a bar
        if point_a.index == point_b.index {
            continue;
        }

        let ab = point_b.value - point_a.value;
        if ab <= params.length_segment_bc || ab >= params.length_segment_ab {
            continue;
        }

        let point_c = find_extreme(compressed, point_b.index, current, Extreme::Low);

        // B and C cannot share a bar
        if point_c.index == point_b.index {
            continue;
        }

        // The retracement must stay meaningful and must not fall below A
        if point_b.value - point_c.value <= params.length_segment_bc
            || point_c.value - point_a.value < 0.0
        {
            continue;
        }

        // Between C and the current bar the level must not have been
        // approached within scope_delta already
        if point_c.index != current {
            let rebound = slice_extreme(compressed, point_c.index + 1, current, Extreme::High);
            if point_b.value - params.scope_delta <= rebound {
                continue;
            }
        }

        debug!(
            price = point_b.value,
            a = point_a.index,
            b = point_b.index,
            c = point_c.index,
            "buy formation confirmed"
        );
        levels.push(PendingLevel {
            price: point_b.value,
            bc: point_b.value - point_c.value,
            side: Side::Buy,
            creation_bar,
        });
    }

    levels
}

fn scan_sell(
    compressed: &[Candle],
    current: usize,
    day_start: usize,
    params: &FormationParams,
    creation_bar: usize,
) -> Vec<PendingLevel> {
    let mut levels = Vec::new();

    for start in (day_start..current).rev() {
        let point_b = find_extreme(compressed, start, current, Extreme::Low);
        let point_a = find_extreme(compressed, start, point_b.index, Extreme::High);

        if point_a.index == point_b.index {
            continue;
        }

        let ab = point_a.value - point_b.value;
        if ab <= params.length_segment_bc || ab >= params.length_segment_ab {
            continue;
        }

        let point_c = find_extreme(compressed, point_b.index, current, Extreme::High);

        if point_c.index == point_b.index {
            continue;
        }

        if point_c.value - point_b.value <= params.length_segment_bc
            || point_a.value - point_c.value < 0.0
        {
            continue;
        }

        if point_c.index != current {
            let rebound = slice_extreme(compressed, point_c.index + 1, current, Extreme::Low);
            if point_b.value + params.scope_delta >= rebound {
                continue;
            }
        }

        debug!(
            price = point_b.value,
            a = point_a.index,
            b = point_b.index,
            c = point_c.index,
            "sell formation confirmed"
        );
        levels.push(PendingLevel {
            price: point_b.value,
            bc: point_c.value - point_b.value,
            side: Side::Sell,
            creation_bar,
        });
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Compressed bars from (high, low) pairs, five minutes apart
    fn compressed_bars(specs: &[(f64, f64)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        specs
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| Candle {
                datetime: start + Duration::minutes(5 * i as i64),
                open: (high + low) / 2.0,
                high,
                low,
                close: (high + low) / 2.0,
                volume: 10.0,
            })
            .collect()
    }

    /// A = 100 at index 5, B = 160 at index 9, C = 120 at index 11,
    /// evaluated at index 12.
    fn scenario_bars() -> Vec<Candle> {
        compressed_bars(&[
            (130.0, 125.0), // 0
            (130.0, 125.0),
            (130.0, 125.0),
            (130.0, 125.0),
            (130.0, 125.0),
            (105.0, 100.0), // 5: point A
            (130.0, 125.0),
            (130.0, 125.0),
            (130.0, 125.0),
            (160.0, 150.0), // 9: point B
            (130.0, 125.0),
            (126.0, 120.0), // 11: point C
            (130.0, 126.0), // 12: current bar
        ])
    }

    fn params(length_segment_bc: f64) -> FormationParams {
        FormationParams {
            length_segment_ab: 1000.0,
            length_segment_bc,
            scope_delta: 5.0,
        }
    }

    #[test]
    fn test_buy_formation_found() {
        let bars = scenario_bars();
        let levels = scan(&bars, 12, 5, Side::Buy, &params(30.0), 144);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 160.0);
        assert_eq!(levels[0].bc, 40.0);
        assert_eq!(levels[0].side, Side::Buy);
        assert_eq!(levels[0].creation_bar, 144);
    }

    #[test]
    fn test_bc_leg_too_short() {
        // BC = 40 <= 50 fails the lower bound
        let bars = scenario_bars();
        let levels = scan(&bars, 12, 5, Side::Buy, &params(50.0), 144);
        assert!(levels.is_empty());
    }

    #[test]
    fn test_overlap_guard_rejects_approached_level() {
        // Raise the current bar's high to within scope_delta of B
        let mut bars = scenario_bars();
        bars[12].high = 156.0;
        let levels = scan(&bars, 12, 5, Side::Buy, &params(30.0), 144);
        assert!(levels.is_empty());
    }

    #[test]
    fn test_retracement_below_a_rejected() {
        // Push C below A: the retracement overshoots the impulse origin
        let mut bars = scenario_bars();
        bars[11].low = 95.0;
        let levels = scan(&bars, 12, 5, Side::Buy, &params(30.0), 144);
        assert!(levels.is_empty());
    }

    #[test]
    fn test_sell_formation_mirrored() {
        // Mirror of the buy scenario around 200
        let bars = compressed_bars(&[
            (75.0, 70.0),  // 0..4 neutral
            (75.0, 70.0),
            (75.0, 70.0),
            (75.0, 70.0),
            (75.0, 70.0),
            (100.0, 95.0), // 5: point A (high 100)
            (75.0, 70.0),
            (75.0, 70.0),
            (75.0, 70.0),
            (50.0, 40.0), // 9: point B (low 40)
            (75.0, 70.0),
            (80.0, 74.0), // 11: point C (high 80)
            (74.0, 70.0), // 12: current
        ]);
        let levels = scan(&bars, 12, 5, Side::Sell, &params(30.0), 7);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 40.0);
        assert_eq!(levels[0].bc, 40.0);
        assert_eq!(levels[0].side, Side::Sell);
    }

    #[test]
    fn test_degenerate_bounds_yield_no_levels() {
        let bars = scenario_bars();
        let degenerate = FormationParams {
            length_segment_ab: 30.0,
            length_segment_bc: 1000.0,
            scope_delta: 5.0,
        };
        assert!(degenerate.is_degenerate());
        for side in [Side::Buy, Side::Sell] {
            assert!(scan(&bars, 12, 0, side, &degenerate, 0).is_empty());
        }
    }

    #[test]
    fn test_first_period_of_day_has_no_candidates() {
        let bars = scenario_bars();
        let levels = scan(&bars, 5, 5, Side::Buy, &params(30.0), 0);
        assert!(levels.is_empty());
    }
}
