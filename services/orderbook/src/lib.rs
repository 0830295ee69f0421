//! Orderbook Service
//!
//! Passive limit-order intake for the swap engine's trading pairs. Orders
//! are validated, priced (`total = amount * price`), and retained as open
//! records for later execution; this crate never matches or settles.

pub mod api;
pub mod book;
pub mod error;

pub use api::{handle_place_order, OrderErrorResponse, PlaceOrderRequest, PlaceOrderResponse};
pub use book::{LimitOrder, OrderBook, OrderStatus};
pub use error::{OrderError, OrderResult};
