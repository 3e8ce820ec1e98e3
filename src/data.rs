//! Data loading
//!
//! Loads OHLCV data from CSV files with per-row validation and optional
//! date-range filtering.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::warn;

use crate::types::Candle;

/// Load OHLCV data from CSV file with validation
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).context("Failed to open CSV file")?;

    let mut candles = Vec::new();
    let mut invalid_count = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = dt_str
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                // Try parsing without timezone and assume UTC
                chrono::NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .context(format!("Failed to parse datetime: {}", dt_str))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: f64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;

        match Candle::new(datetime, open, high, low, close, volume) {
            Ok(candle) => candles.push(candle),
            Err(e) => {
                invalid_count += 1;
                warn!(
                    "Skipping invalid candle at row {} in {:?}: {}",
                    row_idx + 2, // +2 for 1-indexed and header row
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if invalid_count > 0 {
        warn!(
            "Skipped {} invalid candles out of {} in {:?}",
            invalid_count,
            invalid_count + candles.len(),
            path.file_name().unwrap_or_default()
        );
    }

    Ok(candles)
}

/// Filter candles by date range
pub fn filter_candles_by_date(
    candles: Vec<Candle>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Candle> {
    candles
        .into_iter()
        .filter(|c| {
            let after_start = start.is_none_or(|s| c.datetime >= s);
            let before_end = end.is_none_or(|e| c.datetime <= e);
            after_start && before_end
        })
        .collect()
}

/// Parse a date string (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS) to DateTime<Utc>
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    // Try full datetime format first
    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }

    // Try YYYY-MM-DD HH:MM:SS format
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }

    // Try YYYY-MM-DD format (assume start of day)
    if let Ok(nd) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        let ndt = nd.and_hms_opt(0, 0, 0).unwrap();
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }

    anyhow::bail!(
        "Failed to parse date: {}. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS format",
        date_str
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_load_csv_skips_invalid_rows() {
        let mut file = tempfile_with(
            "datetime,open,high,low,close,volume\n\
             2024-01-02 10:00:00,100,105,95,102,1000\n\
             2024-01-02 10:00:05,100,90,105,102,1000\n\
             2024-01-02 10:00:10,102,106,98,104,1200\n",
        );
        file.flush().unwrap();

        let candles = load_csv(file.path()).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 104.0);
    }

    #[test]
    fn test_parse_date_variants() {
        let day = parse_date("2024-01-02").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());

        let with_time = parse_date("2024-01-02 10:30:00").unwrap();
        assert_eq!(
            with_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap()
        );

        assert!(parse_date("02/01/2024").is_err());
    }

    #[test]
    fn test_filter_candles_by_date() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| Candle {
                datetime: Utc.with_ymd_and_hms(2024, 1, 2 + i, 10, 0, 0).unwrap(),
                open: 100.0,
                high: 105.0,
                low: 95.0,
                close: 102.0,
                volume: 1.0,
            })
            .collect();

        let filtered = filter_candles_by_date(
            candles,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
        );
        assert_eq!(filtered.len(), 2);
    }

    /// Minimal named temp file helper for CSV fixtures
    fn tempfile_with(contents: &str) -> NamedTemp {
        let path = std::env::temp_dir().join(format!(
            "formation_strategies_test_{}.csv",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        NamedTemp {
            file,
            path,
        }
    }

    struct NamedTemp {
        file: std::fs::File,
        path: std::path::PathBuf,
    }

    impl NamedTemp {
        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Write for NamedTemp {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.file.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.file.flush()
        }
    }

    impl Drop for NamedTemp {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
