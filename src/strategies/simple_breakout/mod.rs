//! Simple Breakout Strategy
//!
//! Executes confirmed A-B-C formation levels with fixed price offsets:
//! stop entries a fixed distance inside the level, fixed stop-loss and
//! take-profit distances around it.

pub mod config;
pub mod strategy;

pub use config::SimpleBreakoutConfig;
pub use strategy::SimpleBreakoutStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let strategy_config: SimpleBreakoutConfig = serde_json::from_value(config.strategy.clone())
        .map_err(|e| anyhow::anyhow!("Failed to parse simple_breakout config: {}", e))?;
    Ok(Box::new(SimpleBreakoutStrategy::new(
        strategy_config,
        config.trading.quantity,
    )))
}
