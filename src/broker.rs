//! Broker seam between strategies and order execution
//!
//! Strategies talk to a `Broker` trait object: conditional entry orders,
//! per-bar stop/profit exits for open positions, and a session flatten.
//! `SimBroker` is the backtest implementation with intra-bar trigger
//! detection and slippage on stop fills.

use chrono::Utc;
use tracing::{debug, warn};

use crate::oms::{next_order_id, ExitOrder, Order, OrderId, OrderType, Position};
use crate::types::{Candle, Side, Symbol, Trade, TradingModel};

/// Entry order request from a strategy
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub side: Side,
    pub order_type: OrderType,
    pub price: f64,
    pub quantity: f64,
    pub level_price: f64,
    pub model: Option<TradingModel>,
    pub tag: String,
}

impl OrderRequest {
    /// Stop entry: triggers when price moves through `price` in the trade
    /// direction
    pub fn stop(side: Side, price: f64, quantity: f64, level_price: f64, tag: String) -> Self {
        Self {
            side,
            order_type: OrderType::Stop,
            price,
            quantity,
            level_price,
            model: None,
            tag,
        }
    }

    /// At-price entry: fills when price comes back to `price`
    pub fn at_price(side: Side, price: f64, quantity: f64, level_price: f64, tag: String) -> Self {
        Self {
            side,
            order_type: OrderType::Limit,
            price,
            quantity,
            level_price,
            model: None,
            tag,
        }
    }

    /// Attach the trading model carried onto the resulting position
    pub fn with_model(mut self, model: TradingModel) -> Self {
        self.model = Some(model);
        self
    }

    fn into_order(self, symbol: Symbol, submitted_bar: usize) -> Order {
        Order {
            id: next_order_id(),
            symbol,
            side: self.side,
            order_type: self.order_type,
            price: self.price,
            quantity: self.quantity,
            level_price: self.level_price,
            model: self.model,
            tag: self.tag,
            submitted_bar,
            created_at: Utc::now(),
        }
    }
}

/// Order/position collaborator as seen by strategies.
///
/// Entry orders and exit instructions are valid for the next bar only;
/// strategies re-issue them every bar they should remain in force.
pub trait Broker {
    /// Submit a conditional entry order for the next bar. Re-submission with
    /// an already-used tag replaces the open order (idempotent re-submit).
    fn submit(&mut self, request: OrderRequest);

    /// Arm a stop exit on an open position for the next bar
    fn close_at_stop(&mut self, position: OrderId, price: f64, tag: &str);

    /// Arm a profit exit on an open position for the next bar
    fn close_at_profit(&mut self, position: OrderId, price: f64, tag: &str);

    /// Close every open position at the next bar's open
    fn flatten_all(&mut self, tag: &str);

    /// Snapshot of the currently open positions
    fn open_positions(&self) -> Vec<Position>;
}

/// Backtest broker with intra-bar fill detection
#[derive(Debug)]
pub struct SimBroker {
    symbol: Symbol,
    slippage: f64,
    current_bar: usize,
    orders: Vec<Order>,
    positions: Vec<Position>,
    trades: Vec<Trade>,
    flatten: Option<String>,
}

impl SimBroker {
    pub fn new(symbol: Symbol, slippage: f64) -> Self {
        Self {
            symbol,
            slippage,
            current_bar: 0,
            orders: Vec::new(),
            positions: Vec::new(),
            trades: Vec::new(),
            flatten: None,
        }
    }

    /// Process fills for one bar: pending flatten first, then entry
    /// triggers, then armed exits. Orders and exit instructions issued on
    /// the previous bar expire here whether or not they filled.
    pub fn process_bar(&mut self, bar: usize, candle: &Candle) {
        self.current_bar = bar;

        if let Some(reason) = self.flatten.take() {
            for position in std::mem::take(&mut self.positions) {
                self.record_exit(position, candle.open, candle.datetime, &reason);
            }
        }

        let orders = std::mem::take(&mut self.orders);
        for order in orders {
            if order.submitted_bar + 1 != bar {
                continue;
            }
            let fill_price = match (order.side, order.order_type) {
                (Side::Buy, OrderType::Stop) if candle.high >= order.price => {
                    Some(order.price * (1.0 + self.slippage))
                }
                (Side::Sell, OrderType::Stop) if candle.low <= order.price => {
                    Some(order.price * (1.0 - self.slippage))
                }
                (Side::Buy, OrderType::Limit) if candle.low <= order.price => Some(order.price),
                (Side::Sell, OrderType::Limit) if candle.high >= order.price => Some(order.price),
                _ => None,
            };

            if let Some(price) = fill_price {
                debug!(tag = %order.tag, price, "entry order filled");
                self.positions.push(Position {
                    id: order.id,
                    symbol: order.symbol,
                    side: order.side,
                    entry_price: price,
                    quantity: order.quantity,
                    entry_time: candle.datetime,
                    entry_bar: bar,
                    level_price: order.level_price,
                    model: order.model,
                    tag: order.tag,
                    stop_exit: None,
                    profit_exit: None,
                });
            }
        }

        let positions = std::mem::take(&mut self.positions);
        for mut position in positions {
            let exit = Self::exit_fill(&position, candle, self.slippage);
            match exit {
                Some((price, reason)) => {
                    self.record_exit(position, price, candle.datetime, &reason);
                }
                None => {
                    position.stop_exit = None;
                    position.profit_exit = None;
                    self.positions.push(position);
                }
            }
        }
    }

    /// Stop exit is checked before profit within the same bar
    fn exit_fill(position: &Position, candle: &Candle, slippage: f64) -> Option<(f64, String)> {
        match position.side {
            Side::Buy => {
                if let Some(stop) = &position.stop_exit {
                    if candle.low <= stop.price {
                        return Some((stop.price * (1.0 - slippage), stop.tag.clone()));
                    }
                }
                if let Some(profit) = &position.profit_exit {
                    if candle.high >= profit.price {
                        return Some((profit.price, profit.tag.clone()));
                    }
                }
            }
            Side::Sell => {
                if let Some(stop) = &position.stop_exit {
                    if candle.high >= stop.price {
                        return Some((stop.price * (1.0 + slippage), stop.tag.clone()));
                    }
                }
                if let Some(profit) = &position.profit_exit {
                    if candle.low <= profit.price {
                        return Some((profit.price, profit.tag.clone()));
                    }
                }
            }
        }
        None
    }

    fn record_exit(
        &mut self,
        position: Position,
        exit_price: f64,
        exit_time: chrono::DateTime<Utc>,
        reason: &str,
    ) {
        let pnl = position.unrealized_pnl(exit_price);
        debug!(tag = %position.tag, exit_price, pnl, reason, "position closed");
        self.trades.push(Trade {
            symbol: position.symbol,
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            entry_time: position.entry_time,
            exit_time,
            pnl,
            reason: reason.to_string(),
        });
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_orders(&self) -> &[Order] {
        &self.orders
    }
}

impl Broker for SimBroker {
    fn submit(&mut self, request: OrderRequest) {
        debug!(tag = %request.tag, side = ?request.side, price = request.price, "entry order submitted");
        let order = request.into_order(self.symbol.clone(), self.current_bar);
        if let Some(existing) = self.orders.iter_mut().find(|o| o.tag == order.tag) {
            *existing = order;
        } else {
            self.orders.push(order);
        }
    }

    fn close_at_stop(&mut self, position: OrderId, price: f64, tag: &str) {
        match self.positions.iter_mut().find(|p| p.id == position) {
            Some(p) => {
                p.stop_exit = Some(ExitOrder {
                    price,
                    tag: tag.to_string(),
                })
            }
            None => warn!(position, "close_at_stop for unknown position"),
        }
    }

    fn close_at_profit(&mut self, position: OrderId, price: f64, tag: &str) {
        match self.positions.iter_mut().find(|p| p.id == position) {
            Some(p) => {
                p.profit_exit = Some(ExitOrder {
                    price,
                    tag: tag.to_string(),
                })
            }
            None => warn!(position, "close_at_profit for unknown position"),
        }
    }

    fn flatten_all(&mut self, tag: &str) {
        if !self.positions.is_empty() {
            self.flatten = Some(tag.to_string());
        }
    }

    fn open_positions(&self) -> Vec<Position> {
        self.positions.clone()
    }
}
