//! Coefficient SAR/EMA Strategy
//!
//! Executes confirmed A-B-C formation levels through a logarithmic trading
//! model, gated by a Parabolic SAR / EMA indicator pair, with an optional
//! reverse mode that inverts the execution direction.

pub mod config;
pub mod model;
pub mod strategy;

pub use config::CoefficientSarEmaConfig;
pub use model::{build_model, ExecutionMode, ModelParams};
pub use strategy::CoefficientSarEmaStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let strategy_config: CoefficientSarEmaConfig = serde_json::from_value(config.strategy.clone())
        .map_err(|e| anyhow::anyhow!("Failed to parse coefficient_sar_ema config: {}", e))?;
    Ok(Box::new(CoefficientSarEmaStrategy::new(
        strategy_config,
        config.trading.quantity,
    )))
}
