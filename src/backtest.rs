//! Backtesting engine
//!
//! Deterministic bar-sequential fold over the base series: fills for the
//! previous bar's orders are processed first, then the session window is
//! applied, then the strategy evaluates the bar. Everything the strategy
//! submits targets the next bar.

use anyhow::Result;
use tracing::info;

use crate::broker::{Broker, SimBroker};
use crate::config::Config;
use crate::series::SeriesPair;
use crate::strategies::{BarContext, Strategy};
use crate::types::{Symbol, Trade};

/// Outcome of a backtest run
#[derive(Debug, Clone, Default)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    pub total_pnl: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub open_positions: usize,
}

/// Backtest engine
pub struct Backtester {
    config: Config,
    strategy: Box<dyn Strategy>,
}

impl Backtester {
    pub fn new(config: Config, strategy: Box<dyn Strategy>) -> Self {
        Backtester { config, strategy }
    }

    pub fn run(&mut self, series: &SeriesPair) -> Result<BacktestReport> {
        self.strategy.init(series)?;

        let symbol = Symbol::new(self.config.data.symbol.clone());
        let mut broker = SimBroker::new(symbol.clone(), self.config.trading.slippage);

        let session_start = self.config.trading.session_start;
        let session_end = self.config.trading.session_end;

        for bar in 1..series.base().len() {
            let candle = &series.base()[bar];
            broker.process_bar(bar, candle);

            let time = candle.datetime.time();
            if time < session_start {
                continue;
            }
            if time >= session_end {
                if !broker.open_positions().is_empty() {
                    broker.flatten_all("session_close");
                }
                continue;
            }

            let ctx = BarContext {
                symbol: &symbol,
                series,
                bar,
            };
            self.strategy.on_bar(&ctx, &mut broker)?;
        }

        let trades = broker.trades().to_vec();
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let winning_trades = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing_trades = trades.iter().filter(|t| t.pnl <= 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            winning_trades as f64 / trades.len() as f64
        };
        let (buy_signals, sell_signals) = self
            .strategy
            .signals()
            .map(|s| (s.buy_count(), s.sell_count()))
            .unwrap_or((0, 0));
        let open_positions = broker.open_positions().len();

        info!(
            trades = trades.len(),
            total_pnl,
            win_rate = format!("{:.1}%", win_rate * 100.0),
            open_positions,
            "backtest finished"
        );

        Ok(BacktestReport {
            trades,
            total_pnl,
            winning_trades,
            losing_trades,
            win_rate,
            buy_signals,
            sell_signals,
            open_positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::OrderRequest;
    use crate::config::Config;
    use crate::types::{Candle, Side};
    use chrono::{Duration, NaiveTime, TimeZone, Utc};

    /// Strategy that opens one long at a fixed bar and never exits
    #[derive(Debug)]
    struct EnterOnce {
        entry_bar: usize,
    }

    impl Strategy for EnterOnce {
        fn name(&self) -> &'static str {
            "enter_once"
        }

        fn init(&mut self, _series: &SeriesPair) -> Result<()> {
            Ok(())
        }

        fn on_bar(&mut self, ctx: &BarContext<'_>, broker: &mut dyn Broker) -> Result<()> {
            if ctx.bar == self.entry_bar {
                broker.submit(OrderRequest::stop(
                    Side::Buy,
                    128.0,
                    1.0,
                    160.0,
                    "buy_160".into(),
                ));
            }
            Ok(())
        }
    }

    fn flat_candles(count: usize, start_hour: u32) -> Vec<Candle> {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 2, start_hour, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| Candle {
                datetime: start + Duration::minutes(i as i64),
                open: 127.0,
                high: 130.0,
                low: 125.0,
                close: 128.0,
                volume: 1.0,
            })
            .collect()
    }

    fn test_config(session_start: &str, session_end: &str) -> Config {
        let mut config = Config::default();
        config.trading.session_start = NaiveTime::parse_from_str(session_start, "%H:%M:%S").unwrap();
        config.trading.session_end = NaiveTime::parse_from_str(session_end, "%H:%M:%S").unwrap();
        config.trading.slippage = 0.0;
        config
    }

    #[test]
    fn test_session_end_flattens_position() {
        // 30 one-minute bars from 10:00; session ends 10:20
        let series = SeriesPair::new(flat_candles(30, 10), Duration::minutes(5)).unwrap();
        let strategy = EnterOnce { entry_bar: 3 };
        let mut backtester = Backtester::new(
            test_config("10:00:00", "10:20:00"),
            Box::new(strategy),
        );

        let report = backtester.run(&series).unwrap();
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].reason, "session_close");
        assert_eq!(report.open_positions, 0);
        // Flatten executes on the bar after the session end is first seen
        assert_eq!(
            report.trades[0].exit_time.time(),
            NaiveTime::parse_from_str("10:21:00", "%H:%M:%S").unwrap()
        );
    }

    #[test]
    fn test_bars_before_session_start_are_skipped() {
        // Bars 09:00..09:29, session starts 10:00: nothing is evaluated
        let series = SeriesPair::new(flat_candles(30, 9), Duration::minutes(5)).unwrap();
        let mut backtester = Backtester::new(
            test_config("10:00:00", "18:40:00"),
            Box::new(EnterOnce { entry_bar: 3 }),
        );

        let report = backtester.run(&series).unwrap();
        assert!(report.trades.is_empty());
        assert_eq!(report.open_positions, 0);
    }
}
