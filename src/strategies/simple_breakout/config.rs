//! Simple Breakout Configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::formation::FormationParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleBreakoutConfig {
    /// Upper bound on the A-B impulse leg (default: 1000)
    pub length_segment_ab: f64,

    /// Lower bound on both legs (default: 390)
    pub length_segment_bc: f64,

    /// Entry offset inside the level; also the invalidation tolerance
    /// (default: 50)
    pub scope_delta: f64,

    /// Take-profit distance from the level (default: 100)
    pub scope_profite: f64,

    /// Stop-loss distance from the level (default: 300)
    pub scope_stope: f64,
}

impl SimpleBreakoutConfig {
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
}

impl Default for SimpleBreakoutConfig {
    fn default() -> Self {
        Self {
            length_segment_ab: 1000.0,
            length_segment_bc: 390.0,
            scope_delta: 50.0,
            scope_profite: 100.0,
            scope_stope: 300.0,
        }
    }
}
