//! Coefficient SAR/EMA Strategy
//!
//! Per bar: tighten exits on open positions against the Parabolic SAR,
//! rescan formations on period boundaries, re-validate the level book, then
//! build a fresh trading model per surviving level and submit its entry only
//! when the indicator pair confirms the move. In reverse mode a confirmed
//! long model sells at the entry price and a confirmed short model buys.

use anyhow::Result;

use crate::broker::{Broker, OrderRequest};
use crate::formation::{self, FormationParams, LevelBook};
use crate::indicators;
use crate::series::SeriesPair;
use crate::strategies::{BarContext, Strategy};
use crate::types::{Side, SignalMap};

use super::config::CoefficientSarEmaConfig;
use super::model::{build_model, ExecutionMode, ModelParams};

#[derive(Debug)]
pub struct CoefficientSarEmaStrategy {
    config: CoefficientSarEmaConfig,
    params: FormationParams,
    model_params: ModelParams,
    mode: ExecutionMode,
    quantity: f64,
    book: LevelBook,
    signals: SignalMap,
    parabolic: Vec<Option<f64>>,
    ema: Vec<Option<f64>>,
}

impl CoefficientSarEmaStrategy {
    pub fn new(config: CoefficientSarEmaConfig, quantity: f64) -> Self {
        let params = config.formation_params();
        let model_params = config.model_params();
        let mode = config.execution_mode();
        Self {
            config,
            params,
            model_params,
            mode,
            quantity,
            book: LevelBook::new(),
            signals: SignalMap::default(),
            parabolic: Vec::new(),
            ema: Vec::new(),
        }
    }

    /// Both indicator readings for a bar, or None during warmup
    fn snapshot(&self, bar: usize) -> Option<(f64, f64)> {
        let trend_stop = self.parabolic.get(bar).copied().flatten()?;
        let momentum = self.ema.get(bar).copied().flatten()?;
        Some((trend_stop, momentum))
    }

    /// Tighten exits against the SAR.
    ///
    /// Normal mode tightens the stop and leaves the profit to the model;
    /// reverse mode leaves the stop to the model and tightens the profit.
    fn maintain_positions(&self, bar: usize, broker: &mut dyn Broker) {
        let trend_stop = self.parabolic.get(bar).copied().flatten();

        for position in broker.open_positions() {
            let Some(model) = position.model else {
                continue;
            };

            let (stop, profit) = match position.side {
                Side::Buy => {
                    let stop = match (self.mode, trend_stop) {
                        (ExecutionMode::Normal, Some(sar)) => sar.max(model.stop_price),
                        _ => model.stop_price,
                    };
                    let profit = match (self.mode, trend_stop) {
                        (ExecutionMode::Reverse, Some(sar)) => model.profit_price.min(sar),
                        _ => model.profit_price,
                    };
                    (stop, profit)
                }
                Side::Sell => {
                    let stop = match (self.mode, trend_stop) {
                        (ExecutionMode::Normal, Some(sar)) => sar.min(model.stop_price),
                        _ => model.stop_price,
                    };
                    let profit = match (self.mode, trend_stop) {
                        (ExecutionMode::Reverse, Some(sar)) => model.profit_price.max(sar),
                        _ => model.profit_price,
                    };
                    (stop, profit)
                }
            };

            broker.close_at_stop(position.id, stop, "closeStop");
            broker.close_at_profit(position.id, profit, "closeProfit");
        }
    }

    fn place_entries(&self, bar: usize, broker: &mut dyn Broker) {
        let Some((trend_stop, momentum)) = self.snapshot(bar) else {
            return;
        };

        for level in self.book.buy() {
            let model = build_model(level.price, level.bc, Side::Buy, self.mode, &self.model_params);
            if model.enter_price > momentum && model.enter_price > trend_stop {
                let request = match self.mode {
                    ExecutionMode::Normal => OrderRequest::stop(
                        Side::Buy,
                        model.enter_price,
                        self.quantity,
                        level.price,
                        format!("buy_{}", level.price),
                    ),
                    ExecutionMode::Reverse => OrderRequest::at_price(
                        Side::Sell,
                        model.enter_price,
                        self.quantity,
                        level.price,
                        format!("sell_{}", level.price),
                    ),
                };
                broker.submit(request.with_model(model));
            }
        }

        for level in self.book.sell() {
            let model = build_model(level.price, level.bc, Side::Sell, self.mode, &self.model_params);
            if momentum > model.enter_price && trend_stop > model.enter_price {
                let request = match self.mode {
                    ExecutionMode::Normal => OrderRequest::stop(
                        Side::Sell,
                        model.enter_price,
                        self.quantity,
                        level.price,
                        format!("sell_{}", level.price),
                    ),
                    ExecutionMode::Reverse => OrderRequest::at_price(
                        Side::Buy,
                        model.enter_price,
                        self.quantity,
                        level.price,
                        format!("buy_{}", level.price),
                    ),
                };
                broker.submit(request.with_model(model));
            }
        }
    }
}

impl Strategy for CoefficientSarEmaStrategy {
    fn name(&self) -> &'static str {
        "coefficient_sar_ema"
    }

    fn init(&mut self, series: &SeriesPair) -> Result<()> {
        self.book = LevelBook::new();
        self.signals = SignalMap::new(series.base().len());
        self.parabolic = indicators::parabolic_sar(
            series.base(),
            self.config.acceleration_start,
            self.config.acceleration_step,
            self.config.acceleration_max,
        );
        let closes: Vec<f64> = series.base().iter().map(|c| c.close).collect();
        self.ema = indicators::ema(&closes, self.config.ema_period);
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>, broker: &mut dyn Broker) -> Result<()> {
        self.maintain_positions(ctx.bar, broker);

        if ctx.series.is_period_start(ctx.bar) {
            let current = ctx.series.compressed_index_at(ctx.bar);
            let day_start = ctx.series.day_start_index(ctx.bar);
            for side in [Side::Buy, Side::Sell] {
                let levels = formation::scan(
                    ctx.series.compressed(),
                    current,
                    day_start,
                    side,
                    &self.params,
                    ctx.bar,
                );
                if !levels.is_empty() {
                    self.signals.mark(side, ctx.bar);
                }
                self.book.rebuild(side, levels);
            }
        }

        self.book
            .validate(ctx.series, ctx.bar, self.config.scope_delta);
        self.place_entries(ctx.bar, broker);

        Ok(())
    }

    fn signals(&self) -> Option<&SignalMap> {
        Some(&self.signals)
    }
}
