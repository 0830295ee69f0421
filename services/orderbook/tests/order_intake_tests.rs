//! Limit-order intake tests

use orderbook::{handle_place_order, OrderBook, OrderStatus, PlaceOrderRequest};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use services_common::{PairId, Px, Qty, Side, UserId};

#[fixture]
fn book() -> OrderBook {
    OrderBook::new(PairId::new("PSNG_SOL"))
}

fn request(user: &str, side: &str, amount: f64, price: f64) -> PlaceOrderRequest {
    PlaceOrderRequest {
        user_id: user.to_string(),
        side: side.to_string(),
        amount,
        price,
    }
}

#[rstest]
fn test_accepted_orders_rest_open(book: OrderBook) {
    handle_place_order(&book, request("alice", "buy", 2_000.0, 0.5)).expect("buy");
    handle_place_order(&book, request("bob", "sell", 500.0, 0.75)).expect("sell");

    let open = book.open_orders();
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|o| o.status == OrderStatus::Open));
    assert_eq!(open[0].side, Side::Buy);
    assert_eq!(open[1].side, Side::Sell);
}

#[rstest]
fn test_fractional_total_rounds_down(book: OrderBook) {
    // 3 quote units at 0.0001 base each: total 0.0003, representable exactly
    let user = UserId::new("alice");
    let price = Px::checked_from_f64(0.0001).expect("finite");
    let order = book
        .place(&user, Side::Buy, Qty::from_units(3), price)
        .expect("place");
    assert_eq!(order.total, Qty::from_i64(3));

    // Sub-tick totals floor to zero rather than erroring
    let dust = book
        .place(&user, Side::Buy, Qty::from_i64(1), price)
        .expect("place");
    assert!(dust.total.is_zero());
}

#[rstest]
#[case("buy", -5.0, 0.5, "invalid_amount")]
#[case("buy", f64::NAN, 0.5, "invalid_amount")]
#[case("sell", 10.0, 0.0, "invalid_price")]
#[case("sell", 10.0, -1.0, "invalid_price")]
#[case("short", 10.0, 0.5, "invalid_direction")]
fn test_rejections_leave_book_empty(
    book: OrderBook,
    #[case] side: &str,
    #[case] amount: f64,
    #[case] price: f64,
    #[case] kind: &str,
) {
    let err = handle_place_order(&book, request("alice", side, amount, price)).unwrap_err();
    assert_eq!(err.kind, kind);
    assert!(book.is_empty());
}

#[rstest]
fn test_per_user_view_is_isolated(book: OrderBook) {
    handle_place_order(&book, request("alice", "buy", 100.0, 0.5)).expect("place");
    handle_place_order(&book, request("bob", "buy", 200.0, 0.5)).expect("place");

    let alice = book.orders_for(&UserId::new("alice"));
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].amount, Qty::from_units(100));
    assert!(book.orders_for(&UserId::new("carol")).is_empty());
}
