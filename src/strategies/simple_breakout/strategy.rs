//! Simple Breakout Strategy
//!
//! Per bar: refresh exits on open positions, rescan formations on period
//! boundaries, re-validate the level book, and submit a stop entry a fixed
//! distance inside every surviving level.

use anyhow::Result;

use crate::broker::{Broker, OrderRequest};
use crate::formation::{self, FormationParams, LevelBook};
use crate::series::SeriesPair;
use crate::strategies::{BarContext, Strategy};
use crate::types::{Side, SignalMap};

use super::config::SimpleBreakoutConfig;

#[derive(Debug)]
pub struct SimpleBreakoutStrategy {
    config: SimpleBreakoutConfig,
    params: FormationParams,
    quantity: f64,
    book: LevelBook,
    signals: SignalMap,
}

impl SimpleBreakoutStrategy {
    pub fn new(config: SimpleBreakoutConfig, quantity: f64) -> Self {
        let params = config.formation_params();
        Self {
            config,
            params,
            quantity,
            book: LevelBook::new(),
            signals: SignalMap::default(),
        }
    }

    fn maintain_positions(&self, broker: &mut dyn Broker) {
        for position in broker.open_positions() {
            match position.side {
                Side::Buy => {
                    broker.close_at_profit(
                        position.id,
                        position.level_price + self.config.scope_profite,
                        "closeProfit",
                    );
                    broker.close_at_stop(
                        position.id,
                        position.level_price - self.config.scope_stope,
                        "closeStop",
                    );
                }
                Side::Sell => {
                    broker.close_at_profit(
                        position.id,
                        position.level_price - self.config.scope_profite,
                        "closeProfit",
                    );
                    broker.close_at_stop(
                        position.id,
                        position.level_price + self.config.scope_stope,
                        "closeStop",
                    );
                }
            }
        }
    }

    fn place_entries(&self, broker: &mut dyn Broker) {
        for level in self.book.buy() {
            broker.submit(OrderRequest::stop(
                Side::Buy,
                level.price - self.config.scope_delta,
                self.quantity,
                level.price,
                format!("buy_{}", level.price),
            ));
        }
        for level in self.book.sell() {
            broker.submit(OrderRequest::stop(
                Side::Sell,
                level.price + self.config.scope_delta,
                self.quantity,
                level.price,
                format!("sell_{}", level.price),
            ));
        }
    }
}

impl Strategy for SimpleBreakoutStrategy {
    fn name(&self) -> &'static str {
        "simple_breakout"
    }

    fn init(&mut self, series: &SeriesPair) -> Result<()> {
        self.book = LevelBook::new();
        self.signals = SignalMap::new(series.base().len());
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>, broker: &mut dyn Broker) -> Result<()> {
        self.maintain_positions(broker);

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
        self.place_entries(broker);

        Ok(())
    }

    fn signals(&self) -> Option<&SignalMap> {
        Some(&self.signals)
    }
}
