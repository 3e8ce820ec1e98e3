//! Order management types

pub mod types;

pub use types::{next_order_id, ExitOrder, Order, OrderId, OrderType, Position};
