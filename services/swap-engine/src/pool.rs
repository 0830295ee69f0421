//! Constant-product pool state and pure quoting
//!
//! The two quote functions are deliberately asymmetric: a buy pays its fee
//! on the input side (only the net input enters the pool), a sell pays it on
//! the output side (the gross output leaves the pool, the user receives the
//! net). This matches the protocol rule and must not be "fixed".
//!
//! All math runs in `i128` over fixed-point ticks, and `amount_out` is
//! rounded down, so `reserve_base * reserve_quote` never decreases across a
//! correctly committed trade.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use services_common::fixed_point::BASIS_POINTS;
use services_common::{PairId, Px, Qty};

/// Reserves of a single constant-product pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Trading pair this pool serves
    pub pair: PairId,
    /// Base-token reserve
    pub reserve_base: Qty,
    /// Quote-token reserve
    pub reserve_quote: Qty,
}

impl PoolState {
    /// Create a pool with the given reserves
    #[must_use]
    pub fn new(pair: PairId, reserve_base: Qty, reserve_quote: Qty) -> Self {
        Self {
            pair,
            reserve_base,
            reserve_quote,
        }
    }

    /// Spot price, defined as `reserve_base / reserve_quote` regardless of
    /// trade direction
    #[must_use]
    pub fn spot_price(&self) -> Px {
        Px::from_ratio(self.reserve_base, self.reserve_quote).unwrap_or(Px::ZERO)
    }

    /// Constant product `k` in tick terms
    #[must_use]
    pub fn constant_product(&self) -> i128 {
        i128::from(self.reserve_base.as_i64()) * i128::from(self.reserve_quote.as_i64())
    }
}

/// Result of a pure quote: the output amount and the post-trade reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Amount credited to the user
    pub amount_out: Qty,
    /// Input-side reserve after the trade
    pub new_reserve_in: Qty,
    /// Output-side reserve after the trade
    pub new_reserve_out: Qty,
}

fn positive_ticks(amount: Qty) -> EngineResult<i128> {
    let ticks = amount.as_i64();
    if ticks <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(i128::from(ticks))
}

fn to_qty(ticks: i128) -> EngineResult<Qty> {
    i64::try_from(ticks)
        .map(Qty::from_i64)
        .map_err(|_| EngineError::InvalidAmount("amount out of fixed-point range".to_string()))
}

/// Quote a buy: fee on the input side
///
/// `net = amount_in * (1 - fee)`, `amount_out = reserve_out * net /
/// (reserve_in + net)` rounded down. Only the net input is added to the
/// input reserve; the fee portion never enters the pool.
pub fn quote_buy(
    amount_in: Qty,
    reserve_in: Qty,
    reserve_out: Qty,
    fee_bps: u16,
) -> EngineResult<SwapQuote> {
    let amount = positive_ticks(amount_in)?;
    let r_in = i128::from(reserve_in.as_i64());
    let r_out = i128::from(reserve_out.as_i64());

    let net = amount * (i128::from(BASIS_POINTS) - i128::from(fee_bps)) / i128::from(BASIS_POINTS);
    if net <= 0 {
        return Err(EngineError::LiquidityExhausted);
    }

    let new_in = r_in + net;
    let amount_out = r_out * net / new_in;
    let new_out = r_out - amount_out;
    if amount_out <= 0 || new_out <= 0 || new_in <= 0 {
        return Err(EngineError::LiquidityExhausted);
    }

    Ok(SwapQuote {
        amount_out: to_qty(amount_out)?,
        new_reserve_in: to_qty(new_in)?,
        new_reserve_out: to_qty(new_out)?,
    })
}

/// Quote a sell: fee on the output side
///
/// The gross output `reserve_out * amount_in / (reserve_in + amount_in)`
/// leaves the pool; the user receives `gross * (1 - fee)` rounded down.
pub fn quote_sell(
    amount_in: Qty,
    reserve_in: Qty,
    reserve_out: Qty,
    fee_bps: u16,
) -> EngineResult<SwapQuote> {
    let amount = positive_ticks(amount_in)?;
    let r_in = i128::from(reserve_in.as_i64());
    let r_out = i128::from(reserve_out.as_i64());

    let new_in = r_in + amount;
    let gross = r_out * amount / new_in;
    let amount_out =
        gross * (i128::from(BASIS_POINTS) - i128::from(fee_bps)) / i128::from(BASIS_POINTS);
    let new_out = r_out - gross;
    if amount_out <= 0 || new_out <= 0 || new_in <= 0 {
        return Err(EngineError::LiquidityExhausted);
    }

    Ok(SwapQuote {
        amount_out: to_qty(amount_out)?,
        new_reserve_in: to_qty(new_in)?,
        new_reserve_out: to_qty(new_out)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_pool() -> PoolState {
        PoolState::new(
            PairId::new("PSNG_SOL"),
            Qty::from_units(88),
            Qty::from_units(17_000_000),
        )
    }

    #[test]
    fn test_buy_reference_scenario() {
        // 1 base token into an 88 / 17,000,000 pool at 2% fee
        let pool = reference_pool();
        let quote = quote_buy(
            Qty::from_units(1),
            pool.reserve_base,
            pool.reserve_quote,
            200,
        )
        .expect("quote");

        // Net input is exactly 0.98, so the base reserve lands on 88.98
        assert_eq!(quote.new_reserve_in, Qty::checked_from_f64(88.98).unwrap());

        // amount_out = 17,000,000 * 0.98 / 88.98
        let expected = 17_000_000.0 * 0.98 / 88.98;
        assert!((quote.amount_out.as_f64() - expected).abs() < 0.5);
        assert_eq!(
            quote.new_reserve_out,
            pool.reserve_quote.sub(quote.amount_out)
        );
    }

    #[test]
    fn test_buy_is_deterministic() {
        let pool = reference_pool();
        let a = quote_buy(
            Qty::from_units(3),
            pool.reserve_base,
            pool.reserve_quote,
            200,
        )
        .expect("quote");
        let b = quote_buy(
            Qty::from_units(3),
            pool.reserve_base,
            pool.reserve_quote,
            200,
        )
        .expect("quote");
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_product_never_decreases() {
        let mut pool = reference_pool();
        let mut k = pool.constant_product();

        for i in 1..=50 {
            let quote = if i % 2 == 0 {
                let q = quote_buy(Qty::from_units(i), pool.reserve_base, pool.reserve_quote, 200)
                    .expect("buy");
                pool.reserve_base = q.new_reserve_in;
                pool.reserve_quote = q.new_reserve_out;
                q
            } else {
                let q = quote_sell(
                    Qty::from_units(i * 10_000),
                    pool.reserve_quote,
                    pool.reserve_base,
                    200,
                )
                .expect("sell");
                pool.reserve_quote = q.new_reserve_in;
                pool.reserve_base = q.new_reserve_out;
                q
            };
            assert!(quote.amount_out.is_positive());

            let k_after = pool.constant_product();
            assert!(k_after >= k, "k decreased on trade {i}: {k} -> {k_after}");
            k = k_after;
        }
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let pool = reference_pool();
        let err = quote_buy(Qty::ZERO, pool.reserve_base, pool.reserve_quote, 200).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));

        let err = quote_sell(
            Qty::from_i64(-5),
            pool.reserve_quote,
            pool.reserve_base,
            200,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn test_dust_input_is_liquidity_exhausted() {
        // One tick of base into a pool where a tick buys less than a tick of
        // quote: floor rounding drives amount_out to zero
        let err = quote_buy(
            Qty::from_i64(1),
            Qty::from_units(17_000_000),
            Qty::from_units(88),
            200,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::LiquidityExhausted));
    }

    #[test]
    fn test_sell_fee_applies_to_output() {
        let pool = reference_pool();
        let amount_in = Qty::from_units(100_000);
        let with_fee = quote_sell(amount_in, pool.reserve_quote, pool.reserve_base, 200)
            .expect("quote");
        let no_fee =
            quote_sell(amount_in, pool.reserve_quote, pool.reserve_base, 0).expect("quote");

        // Gross output (and therefore the post-trade reserves) are identical;
        // only the user's credited amount shrinks
        assert_eq!(with_fee.new_reserve_out, no_fee.new_reserve_out);
        assert_eq!(with_fee.new_reserve_in, no_fee.new_reserve_in);
        assert!(with_fee.amount_out < no_fee.amount_out);

        let expected = no_fee.amount_out.as_i64() as f64 * 0.98;
        assert!((with_fee.amount_out.as_i64() as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_spot_price_orientation() {
        let pool = reference_pool();
        let spot = pool.spot_price();
        assert!((spot.as_f64() - 88.0 / 17_000_000.0).abs() < 1e-12);
    }
}
