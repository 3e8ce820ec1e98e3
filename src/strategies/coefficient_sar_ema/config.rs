//! Coefficient SAR/EMA Configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::formation::FormationParams;

use super::model::{ExecutionMode, ModelParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientSarEmaConfig {
    /// Upper bound on the A-B impulse leg (default: 1000)
    pub length_segment_ab: f64,

    /// Lower bound on both legs (default: 390)
    pub length_segment_bc: f64,

    /// Level invalidation tolerance (default: 50)
    pub scope_delta: f64,

    /// Logarithm base for the entry offset (default: 1.03)
    pub multiply_delta: f64,

    /// Logarithm base for the profit offset (default: 1.011)
    pub multiply_profit: f64,

    /// Logarithm base for the stop offset (default: 1.0065)
    pub multiply_stop: f64,

    /// Divider applied to the B-C leg before the logarithm (default: 10)
    pub divider: f64,

    /// Price step the offsets are rounded to (default: 10)
    pub price_step: f64,

    /// Fixed extra entry offset, independent of mode (default: 0)
    pub extra_delta: f64,

    /// Parabolic SAR acceleration factor start (default: 0.02)
    pub acceleration_start: f64,

    /// Parabolic SAR acceleration factor step (default: 0.02)
    pub acceleration_step: f64,

    /// Parabolic SAR acceleration factor cap (default: 0.02)
    pub acceleration_max: f64,

    /// EMA period over base-series closes (default: 34)
    pub ema_period: usize,

    /// Invert the execution direction of triggered models (default: false)
    pub reverse: bool,
}

impl CoefficientSarEmaConfig {
    pub fn formation_params(&self) -> FormationParams {
        let params = FormationParams {
            length_segment_ab: self.length_segment_ab,
            length_segment_bc: self.length_segment_bc,
            scope_delta: self.scope_delta,
        };
        if params.is_degenerate() {
            warn!(
                length_segment_ab = self.length_segment_ab,
                length_segment_bc = self.length_segment_bc,
                "segment bounds can never be satisfied; the scanner will emit no formations"
            );
        }
        params
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            multiply_delta: self.multiply_delta,
            multiply_profit: self.multiply_profit,
            multiply_stop: self.multiply_stop,
            divider: self.divider,
            price_step: self.price_step,
            extra_delta: self.extra_delta,
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.reverse {
            ExecutionMode::Reverse
        } else {
            ExecutionMode::Normal
        }
    }
}

impl Default for CoefficientSarEmaConfig {
    fn default() -> Self {
        Self {
            length_segment_ab: 1000.0,
            length_segment_bc: 390.0,
            scope_delta: 50.0,
            multiply_delta: 1.03,
            multiply_profit: 1.011,
            multiply_stop: 1.0065,
            divider: 10.0,
            price_step: 10.0,
            extra_delta: 0.0,
            acceleration_start: 0.02,
            acceleration_step: 0.02,
            acceleration_max: 0.02,
            ema_period: 34,
            reverse: false,
        }
    }
}
