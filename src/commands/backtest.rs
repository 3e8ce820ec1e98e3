//! Backtest command

use anyhow::Result;
use chrono::Duration;
use tracing::info;

use formation_strategies::backtest::Backtester;
use formation_strategies::{data, strategies, Config, SeriesPair};

pub fn run(
    config_path: String,
    strategy_override: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let mut config = Config::from_file(&config_path)?;
    if let Some(name) = strategy_override {
        config.strategy_name = name;
    }

    let start = start.map(|s| data::parse_date(&s)).transpose()?;
    let end = end.map(|s| data::parse_date(&s)).transpose()?;

    let candles = data::load_csv(&config.data.path)?;
    let candles = data::filter_candles_by_date(candles, start, end);
    anyhow::ensure!(!candles.is_empty(), "No candles in the selected range");

    let series = SeriesPair::new(
        candles,
        Duration::minutes(config.trading.compression_minutes),
    )?;
    info!(
        symbol = %config.data.symbol,
        bars = series.base().len(),
        periods = series.compressed().len(),
        "series loaded"
    );

    let strategy = strategies::create_strategy(&config)?;
    info!(strategy = strategy.name(), "starting backtest");

    let mut backtester = Backtester::new(config, strategy);
    let report = backtester.run(&series)?;

    println!("\n=== Backtest Results ===");
    println!("Trades:         {}", report.trades.len());
    println!("Winners:        {}", report.winning_trades);
    println!("Losers:         {}", report.losing_trades);
    println!("Win rate:       {:.1}%", report.win_rate * 100.0);
    println!("Total PnL:      {:.2}", report.total_pnl);
    println!("Buy signals:    {}", report.buy_signals);
    println!("Sell signals:   {}", report.sell_signals);
    if report.open_positions > 0 {
        println!("Still open:     {}", report.open_positions);
    }

    for trade in &report.trades {
        println!(
            "{} {:?} entry {:.2} exit {:.2} pnl {:.2} ({})",
            trade.exit_time.format("%Y-%m-%d %H:%M:%S"),
            trade.side,
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            trade.reason
        );
    }

    Ok(())
}
