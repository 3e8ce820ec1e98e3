//! Base/compressed series management
//!
//! Owns the fine-grained base series and the coarser series derived from it
//! by timestamp-aligned compression, plus the index bookkeeping the formation
//! scanner needs: period boundaries, per-day start indices, and extreme
//! queries over index ranges.

use chrono::{DateTime, Duration, DurationRound, Utc};
use itertools::Itertools;
use thiserror::Error;

use crate::types::{Candle, Extreme, SwingPoint};

/// Errors raised while deriving the compressed series
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,
    #[error("non-monotonic timestamps at bar {index}: {previous} >= {current}")]
    DataGap {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("invalid compression interval: {0}")]
    InvalidInterval(String),
}

/// A base series together with its compressed counterpart.
///
/// Construction validates timestamp monotonicity (a gap in ordering is a data
/// error, not something to repair) and precomputes, per base bar, the index
/// of the compressed bar containing it and whether it opens a new compressed
/// period.
#[derive(Debug, Clone)]
pub struct SeriesPair {
    base: Vec<Candle>,
    compressed: Vec<Candle>,
    compressed_index: Vec<usize>,
    period_start: Vec<bool>,
    day_start: Vec<usize>,
}

impl SeriesPair {
    pub fn new(base: Vec<Candle>, interval: Duration) -> Result<Self, SeriesError> {
        if base.is_empty() {
            return Err(SeriesError::Empty);
        }
        if interval <= Duration::zero() {
            return Err(SeriesError::InvalidInterval(format!(
                "non-positive interval {interval}"
            )));
        }

        for i in 1..base.len() {
            if base[i].datetime <= base[i - 1].datetime {
                return Err(SeriesError::DataGap {
                    index: i,
                    previous: base[i - 1].datetime,
                    current: base[i].datetime,
                });
            }
        }

        let mut windows = Vec::with_capacity(base.len());
        for candle in &base {
            let window = candle
                .datetime
                .duration_trunc(interval)
                .map_err(|e| SeriesError::InvalidInterval(e.to_string()))?;
            windows.push(window);
        }

        let mut compressed = Vec::new();
        for (window, group) in &base
            .iter()
            .zip(windows.iter())
            .chunk_by(|(_, window)| **window)
        {
            let bars: Vec<&Candle> = group.map(|(candle, _)| candle).collect();
            compressed.push(Candle {
                datetime: window,
                open: bars[0].open,
                high: bars.iter().map(|c| c.high).fold(f64::MIN, f64::max),
                low: bars.iter().map(|c| c.low).fold(f64::MAX, f64::min),
                close: bars[bars.len() - 1].close,
                volume: bars.iter().map(|c| c.volume).sum(),
            });
        }

        let mut compressed_index = Vec::with_capacity(base.len());
        let mut period_start = Vec::with_capacity(base.len());
        let mut current = 0usize;
        for i in 0..base.len() {
            let starts = i == 0 || windows[i] != windows[i - 1];
            if starts && i > 0 {
                current += 1;
            }
            period_start.push(starts);
            compressed_index.push(current);
        }

        let mut day_start = Vec::with_capacity(compressed.len());
        let mut start_of_day = 0usize;
        for i in 0..compressed.len() {
            if i > 0 && compressed[i].datetime.date_naive() != compressed[i - 1].datetime.date_naive()
            {
                start_of_day = i;
            }
            day_start.push(start_of_day);
        }

        Ok(SeriesPair {
            base,
            compressed,
            compressed_index,
            period_start,
            day_start,
        })
    }

    pub fn base(&self) -> &[Candle] {
        &self.base
    }

    pub fn compressed(&self) -> &[Candle] {
        &self.compressed
    }

    /// True when the base bar is the first bar of a new compressed period
    pub fn is_period_start(&self, base_index: usize) -> bool {
        self.period_start[base_index]
    }

    /// Index of the compressed bar containing the given base bar
    pub fn compressed_index_at(&self, base_index: usize) -> usize {
        self.compressed_index[base_index]
    }

    /// Index of the first compressed bar of the trading day containing the
    /// given base bar
    pub fn day_start_index(&self, base_index: usize) -> usize {
        self.day_start[self.compressed_index[base_index]]
    }
}

/// Find the extreme bar over the inclusive index range `[start, end]`.
///
/// `start <= end` and `end < candles.len()` is a caller contract; violating
/// it is a programming error and panics. Ties resolve to the earliest index.
pub fn find_extreme(candles: &[Candle], start: usize, end: usize, extreme: Extreme) -> SwingPoint {
    assert!(
        start <= end && end < candles.len(),
        "swing range [{start}, {end}] out of bounds for {} bars",
        candles.len()
    );

    let mut point = SwingPoint {
        index: start,
        value: match extreme {
            Extreme::High => candles[start].high,
            Extreme::Low => candles[start].low,
        },
    };
    for (index, candle) in candles.iter().enumerate().take(end + 1).skip(start + 1) {
        let better = match extreme {
            Extreme::High => candle.high > point.value,
            Extreme::Low => candle.low < point.value,
        };
        if better {
            point = SwingPoint {
                index,
                value: match extreme {
                    Extreme::High => candle.high,
                    Extreme::Low => candle.low,
                },
            };
        }
    }
    point
}

/// Extreme value over the inclusive index range `[start, end]`
pub fn slice_extreme(candles: &[Candle], start: usize, end: usize, extreme: Extreme) -> f64 {
    find_extreme(candles, start, end, extreme).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn minute_candles(specs: &[(f64, f64)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        specs
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| Candle {
                datetime: start + Duration::minutes(i as i64),
                open: (high + low) / 2.0,
                high,
                low,
                close: (high + low) / 2.0,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn test_compression_aggregates_ohlc() {
        // 10 one-minute bars into 5-minute periods -> 2 compressed bars
        let specs: Vec<(f64, f64)> = (0..10).map(|i| (110.0 + i as f64, 90.0 - i as f64)).collect();
        let series = SeriesPair::new(minute_candles(&specs), Duration::minutes(5)).unwrap();

        assert_eq!(series.compressed().len(), 2);
        assert_eq!(series.compressed()[0].high, 114.0);
        assert_eq!(series.compressed()[0].low, 86.0);
        assert_eq!(series.compressed()[1].high, 119.0);
        assert_eq!(series.compressed()[1].low, 81.0);
        assert_eq!(series.compressed()[0].volume, 500.0);
    }

    #[test]
    fn test_period_boundaries_and_indices() {
        let specs: Vec<(f64, f64)> = (0..12).map(|_| (100.0, 99.0)).collect();
        let series = SeriesPair::new(minute_candles(&specs), Duration::minutes(5)).unwrap();

        assert!(series.is_period_start(0));
        assert!(!series.is_period_start(4));
        assert!(series.is_period_start(5));
        assert!(series.is_period_start(10));
        assert_eq!(series.compressed_index_at(4), 0);
        assert_eq!(series.compressed_index_at(5), 1);
        assert_eq!(series.compressed_index_at(11), 2);
    }

    #[test]
    fn test_day_start_resets_across_days() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 23, 55, 0).unwrap();
        let candles: Vec<Candle> = (0..4)
            .map(|i| Candle {
                datetime: start + Duration::minutes(i * 5),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1.0,
            })
            .collect();
        let series = SeriesPair::new(candles, Duration::minutes(5)).unwrap();

        // Bars 0 (23:55) belong to the first day; bars 1.. (00:00+) to the next
        assert_eq!(series.day_start_index(0), 0);
        assert_eq!(series.day_start_index(1), 1);
        assert_eq!(series.day_start_index(3), 1);
    }

    #[test]
    fn test_data_gap_detected() {
        let mut candles = minute_candles(&[(100.0, 99.0), (100.0, 99.0), (100.0, 99.0)]);
        candles[2].datetime = candles[0].datetime;

        match SeriesPair::new(candles, Duration::minutes(5)) {
            Err(SeriesError::DataGap { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected DataGap, got {other:?}"),
        }
    }

    #[test]
    fn test_find_extreme_single_bar() {
        let candles = minute_candles(&[(105.0, 95.0), (110.0, 90.0)]);
        let high = find_extreme(&candles, 1, 1, Extreme::High);
        assert_eq!(high.index, 1);
        assert_eq!(high.value, 110.0);
        let low = find_extreme(&candles, 0, 0, Extreme::Low);
        assert_eq!(low.index, 0);
        assert_eq!(low.value, 95.0);
    }

    #[test]
    fn test_find_extreme_dominates_range() {
        let candles = minute_candles(&[(105.0, 95.0), (120.0, 80.0), (110.0, 90.0)]);
        let high = find_extreme(&candles, 0, 2, Extreme::High);
        assert_eq!(high.index, 1);
        assert!(candles.iter().all(|c| c.high <= high.value));
        let low = find_extreme(&candles, 0, 2, Extreme::Low);
        assert_eq!(low.index, 1);
        assert!(candles.iter().all(|c| c.low >= low.value));
    }

    #[test]
    fn test_find_extreme_tie_breaks_to_earliest() {
        let candles = minute_candles(&[(100.0, 95.0), (120.0, 90.0), (120.0, 90.0)]);
        assert_eq!(find_extreme(&candles, 0, 2, Extreme::High).index, 1);
        assert_eq!(find_extreme(&candles, 1, 2, Extreme::Low).index, 1);
    }

    #[test]
    #[should_panic(expected = "swing range")]
    fn test_find_extreme_rejects_bad_range() {
        let candles = minute_candles(&[(100.0, 95.0), (100.0, 95.0)]);
        find_extreme(&candles, 1, 5, Extreme::High);
    }
}
