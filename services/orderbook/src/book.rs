//! Passive limit-order store
//!
//! Orders are accepted, validated, priced, and retained as open records.
//! Nothing here matches or settles: execution against resting orders is a
//! separate concern and intake must not block on it.

use crate::error::{OrderError, OrderResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use services_common::{PairId, Px, Qty, Side, Ts, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Lifecycle state of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted and resting; no fills have occurred
    Open,
}

/// A resting limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    /// Book-assigned order identifier
    pub id: u64,
    /// Owner of the order
    pub user: UserId,
    /// Pair the order rests on
    pub pair: PairId,
    /// Trade direction
    pub side: Side,
    /// Order size in quote-token units
    pub amount: Qty,
    /// Limit price in base per quote
    pub price: Px,
    /// Base-token value at the limit price (`amount * price`)
    pub total: Qty,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Acceptance timestamp
    pub created_at: Ts,
}

/// Book of resting limit orders for one trading pair
pub struct OrderBook {
    pair: PairId,
    next_id: AtomicU64,
    orders: RwLock<Vec<LimitOrder>>,
}

impl OrderBook {
    /// Create an empty book for a pair
    #[must_use]
    pub fn new(pair: PairId) -> Self {
        Self {
            pair,
            next_id: AtomicU64::new(1),
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Pair this book serves
    #[must_use]
    pub const fn pair(&self) -> &PairId {
        &self.pair
    }

    /// Validate and accept a limit order
    pub fn place(
        &self,
        user: &UserId,
        side: Side,
        amount: Qty,
        price: Px,
    ) -> OrderResult<LimitOrder> {
        if !amount.is_positive() {
            return Err(OrderError::InvalidAmount(
                "amount must be a positive number".to_string(),
            ));
        }
        if !price.is_positive() {
            return Err(OrderError::InvalidPrice(
                "price must be a positive number".to_string(),
            ));
        }
        let total = price.mul_qty(amount).ok_or(OrderError::TotalOverflow)?;

        let order = LimitOrder {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            user: user.clone(),
            pair: self.pair.clone(),
            side,
            amount,
            price,
            total,
            status: OrderStatus::Open,
            created_at: Ts::now(),
        };
        info!(
            order_id = order.id,
            user = %order.user,
            side = %order.side,
            amount = %order.amount,
            price = %order.price,
            "limit order accepted"
        );
        self.orders.write().push(order.clone());
        Ok(order)
    }

    /// All open orders, in acceptance order
    #[must_use]
    pub fn open_orders(&self) -> Vec<LimitOrder> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.status == OrderStatus::Open)
            .cloned()
            .collect()
    }

    /// Open orders belonging to one user, in acceptance order
    #[must_use]
    pub fn orders_for(&self, user: &UserId) -> Vec<LimitOrder> {
        self.orders
            .read()
            .iter()
            .filter(|o| o.status == OrderStatus::Open && &o.user == user)
            .cloned()
            .collect()
    }

    /// Number of orders ever accepted
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the book holds no orders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(PairId::new("PSNG_SOL"))
    }

    #[test]
    fn test_place_assigns_sequential_ids() -> OrderResult<()> {
        let book = book();
        let user = UserId::new("alice");
        let price = Px::checked_from_f64(0.001).expect("finite");

        let a = book.place(&user, Side::Buy, Qty::from_units(100), price)?;
        let b = book.place(&user, Side::Sell, Qty::from_units(50), price)?;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(book.len(), 2);
        Ok(())
    }

    #[test]
    fn test_total_is_amount_times_price() -> OrderResult<()> {
        let book = book();
        let user = UserId::new("alice");
        let price = Px::checked_from_f64(0.5).expect("finite");

        let order = book.place(&user, Side::Buy, Qty::from_units(2_000), price)?;
        assert_eq!(order.total, Qty::from_units(1_000));
        assert_eq!(order.status, OrderStatus::Open);
        Ok(())
    }

    #[test]
    fn test_rejects_non_positive_amount_and_price() {
        let book = book();
        let user = UserId::new("alice");
        let price = Px::checked_from_f64(0.5).expect("finite");

        assert!(matches!(
            book.place(&user, Side::Buy, Qty::ZERO, price),
            Err(OrderError::InvalidAmount(_))
        ));
        assert!(matches!(
            book.place(&user, Side::Buy, Qty::from_units(10), Px::ZERO),
            Err(OrderError::InvalidPrice(_))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn test_orders_for_filters_by_user() -> OrderResult<()> {
        let book = book();
        let price = Px::checked_from_f64(0.001).expect("finite");
        book.place(&UserId::new("alice"), Side::Buy, Qty::from_units(10), price)?;
        book.place(&UserId::new("bob"), Side::Sell, Qty::from_units(20), price)?;
        book.place(&UserId::new("alice"), Side::Sell, Qty::from_units(30), price)?;

        let alice = book.orders_for(&UserId::new("alice"));
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|o| o.user == UserId::new("alice")));
        Ok(())
    }
}
