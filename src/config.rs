//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. The strategy
//! section stays opaque here; each strategy's factory deserializes it.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub trading: TradingConfig,
    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,
    pub strategy: serde_json::Value,
}

fn default_strategy_name() -> String {
    "simple_breakout".to_string()
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig::default(),
            trading: TradingConfig::default(),
            strategy_name: default_strategy_name(),
            strategy: serde_json::json!({}),
        }
    }
}

/// Input data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the OHLCV CSV file of the base series
    pub path: String,
    pub symbol: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: "data/RTS_5s.csv".to_string(),
            symbol: "RTS".to_string(),
        }
    }
}

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Contracts per order
    pub quantity: f64,

    /// Fractional slippage applied to stop fills
    pub slippage: f64,

    /// No orders before this time of day
    pub session_start: NaiveTime,

    /// Flatten everything at this time of day
    pub session_end: NaiveTime,

    /// Compression interval of the derived series, in minutes
    pub compression_minutes: i64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            quantity: 1.0,
            slippage: 0.001,
            session_start: NaiveTime::from_hms_opt(10, 4, 55).unwrap(),
            session_end: NaiveTime::from_hms_opt(18, 40, 0).unwrap(),
            compression_minutes: 5,
        }
    }
}
