//! Trading Strategies Module
//!
//! Strategy trait driven bar-by-bar by the backtest engine, plus a dynamic
//! registry so strategies are constructed by name from configuration.

pub mod coefficient_sar_ema;
pub mod simple_breakout;

use crate::broker::Broker;
use crate::series::SeriesPair;
use crate::types::{SignalMap, Symbol};
use crate::Config;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

// =============================================================================
// Strategy Trait - The contract all strategies must implement
// =============================================================================

/// Context provided to a strategy for one bar's evaluation
#[derive(Debug)]
pub struct BarContext<'a> {
    pub symbol: &'a Symbol,
    pub series: &'a SeriesPair,
    /// Base-series index of the bar being evaluated
    pub bar: usize,
}

/// Trading strategy trait - defines the mandatory interface for all
/// strategies.
///
/// The engine calls `init` once with the full series (indicator precompute),
/// then `on_bar` for every base bar inside the trading session, strictly in
/// index order.
pub trait Strategy: Send + std::fmt::Debug {
    /// Strategy identifier (must match config's strategy_name)
    fn name(&self) -> &'static str;

    /// Initialize strategy state for a series (called once before the run)
    fn init(&mut self, series: &SeriesPair) -> Result<()>;

    /// Evaluate one bar: maintain exits, rescan on period boundaries,
    /// validate pending levels, and submit conditional orders
    fn on_bar(&mut self, ctx: &BarContext<'_>, broker: &mut dyn Broker) -> Result<()>;

    /// Per-bar formation flags collected during the run
    fn signals(&self) -> Option<&SignalMap> {
        None
    }
}

// =============================================================================
// Strategy Factory - Type alias for strategy constructor functions
// =============================================================================

/// Factory function type for creating strategies from config
pub type StrategyFactory = fn(&Config) -> Result<Box<dyn Strategy>>;

// =============================================================================
// Strategy Registry - Dynamic registration without hardcoding
// =============================================================================

/// Global strategy registry
static REGISTRY: OnceLock<RwLock<HashMap<&'static str, StrategyFactory>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<&'static str, StrategyFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(
            "simple_breakout",
            simple_breakout::create as StrategyFactory,
        );
        map.insert(
            "coefficient_sar_ema",
            coefficient_sar_ema::create as StrategyFactory,
        );
        RwLock::new(map)
    })
}

/// Create a strategy from configuration
pub fn create_strategy(config: &Config) -> Result<Box<dyn Strategy>> {
    let registry = get_registry().read().unwrap();

    let factory = registry.get(config.strategy_name.as_str()).ok_or_else(|| {
        let available: Vec<_> = registry.keys().copied().collect();
        anyhow::anyhow!(
            "Unknown strategy: '{}'. Available: {}",
            config.strategy_name,
            available.join(", ")
        )
    })?;

    factory(config)
}

/// Get list of available strategy names
pub fn available_strategies() -> Vec<&'static str> {
    get_registry().read().unwrap().keys().copied().collect()
}

/// Register a new strategy (for plugins or testing)
pub fn register_strategy(name: &'static str, factory: StrategyFactory) {
    get_registry().write().unwrap().insert(name, factory);
}
