//! Request/response shapes for limit-order intake

use crate::book::{LimitOrder, OrderBook};
use crate::error::OrderError;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Side, UserId};

/// Limit-order request as submitted by the trading UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    /// Trusted user identifier (verified by the identity collaborator)
    pub user_id: String,
    /// "buy" or "sell"
    pub side: String,
    /// Order size in quote-token units
    pub amount: f64,
    /// Limit price in base per quote
    pub price: f64,
}

/// Successful order acceptance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    /// Always `true`
    pub success: bool,
    /// Book-assigned order identifier
    pub order_id: u64,
    /// Base-token value at the limit price
    pub total: f64,
}

/// Rejected order, carrying a stable error kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Stable machine-readable kind (see [`OrderError::kind`])
    pub kind: String,
    /// Human-readable message
    pub error: String,
}

impl From<OrderError> for OrderErrorResponse {
    fn from(err: OrderError) -> Self {
        Self {
            success: false,
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// Validate and place a limit order
pub fn handle_place_order(
    book: &OrderBook,
    request: PlaceOrderRequest,
) -> Result<PlaceOrderResponse, OrderErrorResponse> {
    let side: Side = request
        .side
        .parse()
        .map_err(|_| OrderError::InvalidDirection(request.side.clone()))?;
    let amount = Qty::checked_from_f64(request.amount)
        .filter(Qty::is_positive)
        .ok_or_else(|| OrderError::InvalidAmount("amount must be a positive number".to_string()))?;
    let price = Px::checked_from_f64(request.price)
        .filter(|p| p.is_positive())
        .ok_or_else(|| OrderError::InvalidPrice("price must be a positive number".to_string()))?;

    let order: LimitOrder = book.place(&UserId::new(request.user_id), side, amount, price)?;
    Ok(PlaceOrderResponse {
        success: true,
        order_id: order.id,
        total: order.total.as_f64(),
    })
}
