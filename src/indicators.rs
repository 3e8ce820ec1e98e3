//! Technical indicators
//!
//! The EMA wraps the battle-tested `ta` crate. Parabolic SAR is implemented
//! here because `ta` does not provide it; it is the usual Wilder acceleration
//! factor system (direction, extreme point, accelerating stop).
//!
//! All indicators return `Vec<Option<f64>>` aligned to the input, with `None`
//! during warmup.

use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::types::Candle;

/// Calculate Exponential Moving Average
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    let mut indicator = match ExponentialMovingAverage::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    let mut result = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let ema_val = indicator.next(value);
        if i + 1 >= period {
            result.push(Some(ema_val));
        } else {
            result.push(None);
        }
    }

    result
}

/// Calculate Parabolic SAR.
///
/// Needs at least two bars; the initial direction comes from the first two
/// closes. The SAR for an uptrend is clamped below the prior two lows (above
/// the prior two highs in a downtrend), and a penetration reverses the trend,
/// resetting the acceleration factor.
pub fn parabolic_sar(
    candles: &[Candle],
    acceleration_start: f64,
    acceleration_step: f64,
    acceleration_max: f64,
) -> Vec<Option<f64>> {
    let n = candles.len();
    let mut result = vec![None; n];
    if n < 2 {
        return result;
    }

    let mut is_long = candles[1].close >= candles[0].close;
    let mut af = acceleration_start;
    let mut ep;
    let mut sar;

    if is_long {
        sar = candles[0].low;
        ep = candles[1].high;
    } else {
        sar = candles[0].high;
        ep = candles[1].low;
    }

    result[1] = Some(sar);

    for i in 2..n {
        let mut new_sar = sar + af * (ep - sar);

        if is_long {
            new_sar = new_sar.min(candles[i - 1].low).min(candles[i - 2].low);

            if candles[i].low < new_sar {
                // Reverse to short; SAR becomes the previous extreme point
                is_long = false;
                new_sar = ep;
                ep = candles[i].low;
                af = acceleration_start;
            } else if candles[i].high > ep {
                ep = candles[i].high;
                af = (af + acceleration_step).min(acceleration_max);
            }
        } else {
            new_sar = new_sar.max(candles[i - 1].high).max(candles[i - 2].high);

            if candles[i].high > new_sar {
                // Reverse to long
                is_long = true;
                new_sar = ep;
                ep = candles[i].high;
                af = acceleration_start;
            } else if candles[i].low < ep {
                ep = candles[i].low;
                af = (af + acceleration_step).min(acceleration_max);
            }
        }

        sar = new_sar;
        result[i] = Some(sar);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                datetime: start + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_ema() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert!(result[2].is_some());
        // EMA values should be reasonable
        let ema_val = result[4].unwrap();
        assert!(ema_val > 3.0 && ema_val < 5.0);
    }

    #[test]
    fn test_psar_uptrend_below_price() {
        // In a clear uptrend, the SAR should stay below the lows
        let mut data = Vec::new();
        for i in 0..10 {
            let base = 100.0 + i as f64 * 3.0;
            data.push((base, base + 2.0, base - 1.0, base + 1.5));
        }
        let candles = make_ohlc_candles(&data);
        let result = parabolic_sar(&candles, 0.02, 0.02, 0.2);

        for i in 2..10 {
            let sar = result[i].unwrap();
            assert!(
                sar < candles[i].low,
                "SAR ({sar}) should be below low ({}) at bar {i}",
                candles[i].low
            );
        }
    }

    #[test]
    fn test_psar_flips_after_reversal() {
        let data = [
            (100.0, 105.0, 98.0, 103.0),
            (103.0, 108.0, 101.0, 107.0),
            (107.0, 112.0, 105.0, 111.0),
            (111.0, 115.0, 109.0, 114.0),
            // Sharp reversal
            (114.0, 114.5, 100.0, 101.0),
            (101.0, 102.0, 95.0, 96.0),
            (96.0, 97.0, 90.0, 91.0),
        ];
        let candles = make_ohlc_candles(&data);
        let result = parabolic_sar(&candles, 0.02, 0.02, 0.2);

        let mut below = false;
        let mut above_after_below = false;
        for i in 1..7 {
            let sar = result[i].unwrap();
            if sar < candles[i].close {
                below = true;
            }
            if below && sar > candles[i].close {
                above_after_below = true;
            }
        }
        assert!(above_after_below, "SAR should flip sides after the reversal");
    }

    #[test]
    fn test_psar_too_few_bars() {
        let candles = make_ohlc_candles(&[(100.0, 105.0, 95.0, 102.0)]);
        let result = parabolic_sar(&candles, 0.02, 0.02, 0.2);
        assert!(result.iter().all(|v| v.is_none()));
    }
}
