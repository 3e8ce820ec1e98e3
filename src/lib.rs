//! Formation Trading Strategies
//!
//! An automated trading-signal engine that scans a compressed intraday price
//! series for three-point A-B-C zig-zag formations, holds the resulting
//! pending levels while newer price action validates them, and executes them
//! either with fixed price offsets or through a logarithmic trading model
//! gated by a Parabolic SAR / EMA indicator pair.
//!
//! # Example
//! ```no_run
//! use chrono::Duration;
//! use formation_strategies::backtest::Backtester;
//! use formation_strategies::{data, strategies, Config, SeriesPair};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("configs/rts_5s.json")?;
//!     let candles = data::load_csv(&config.data.path)?;
//!     let series = SeriesPair::new(
//!         candles,
//!         Duration::minutes(config.trading.compression_minutes),
//!     )?;
//!     let strategy = strategies::create_strategy(&config)?;
//!     let report = Backtester::new(config, strategy).run(&series)?;
//!     println!("{} trades, pnl {:.2}", report.trades.len(), report.total_pnl);
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod broker;
pub mod config;
pub mod data;
pub mod formation;
pub mod indicators;
pub mod oms;
pub mod series;
pub mod strategies;
pub mod types;

pub use config::Config;
pub use series::SeriesPair;
pub use strategies::Strategy;
pub use types::*;
