//! Swap execution: snapshot, quote, and atomic commit with bounded retry
//!
//! One call to [`SwapEngine::execute_swap`] is one atomic unit: debit the
//! input balance, credit the output balance, move both reserves, and append
//! the trade record, or none of it. Committed trades are linearizable with
//! respect to the pool: every quote was computed against the immediately
//! preceding committed reserve state, or the commit conflicts and retries.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{TradeLedger, TradeRecord};
use crate::pool::{self, PoolState};
use crate::store::{BalanceKey, CommitOutcome, StateStore, SwapCommit};
use services_common::{PairId, PriceTick, Px, Qty, Side, Token, Ts, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of a committed swap, as returned to the caller and forwarded to
/// the chart aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    /// Amount debited from the user
    pub amount_in: Qty,
    /// Amount credited to the user
    pub amount_out: Qty,
    /// Spot price before the trade
    pub previous_price: Px,
    /// Spot price after the trade
    pub new_price: Px,
    /// Trade volume in base-token terms
    pub volume_base: Qty,
    /// Commit timestamp
    pub ts: Ts,
}

/// Transactional core executing swaps against one trading pair
pub struct SwapEngine {
    config: EngineConfig,
    store: Arc<StateStore>,
    ledger: Arc<TradeLedger>,
    chart_tx: Option<mpsc::Sender<PriceTick>>,
}

impl SwapEngine {
    /// Create an engine with a fresh store and in-memory ledger
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(config, Arc::new(StateStore::new()), Arc::new(TradeLedger::new()))
    }

    /// Create an engine over existing state (e.g. a journal-backed ledger)
    #[must_use]
    pub fn with_parts(
        config: EngineConfig,
        store: Arc<StateStore>,
        ledger: Arc<TradeLedger>,
    ) -> Self {
        Self {
            config,
            store,
            ledger,
            chart_tx: None,
        }
    }

    /// Attach the chart aggregator's tick channel
    #[must_use]
    pub fn with_chart(mut self, tx: mpsc::Sender<PriceTick>) -> Self {
        self.chart_tx = Some(tx);
        self
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared state store
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Shared trade ledger
    #[must_use]
    pub fn ledger(&self) -> &Arc<TradeLedger> {
        &self.ledger
    }

    /// Initialize (or re-seed) the pool; gated by the admin secret
    ///
    /// Also emits a zero-volume tick so the chart aggregator opens its
    /// initial bucket at the starting spot price.
    pub fn init_pool(
        &self,
        secret: &str,
        reserve_base: Qty,
        reserve_quote: Qty,
    ) -> EngineResult<PoolState> {
        if secret != self.config.admin_secret {
            return Err(EngineError::Unauthorized);
        }
        if !reserve_base.is_positive() || !reserve_quote.is_positive() {
            return Err(EngineError::InvalidAmount(
                "reserves must be positive".to_string(),
            ));
        }

        let pool = PoolState::new(self.config.pair.pair_id.clone(), reserve_base, reserve_quote);
        self.store.init_pool(pool.clone());

        let spot = pool.spot_price();
        info!(
            pair = %pool.pair,
            "pool initialized: {} base / {} quote, spot {}",
            reserve_base, reserve_quote, spot
        );
        self.publish_tick(PriceTick {
            pair: pool.pair.clone(),
            ts: Ts::now(),
            previous_price: spot,
            new_price: spot,
            volume_base: Qty::ZERO,
        });
        Ok(pool)
    }

    /// Credit a balance on behalf of the deposit-detection collaborator
    pub fn credit(&self, user: &UserId, token: &Token, amount: Qty) -> EngineResult<Qty> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "credit must be positive, got {amount}"
            )));
        }
        let key = BalanceKey::new(user.clone(), token.clone());
        let updated = self.store.credit(&key, amount)?;
        debug!("credited {} {} to {}, balance now {}", amount, token, user, updated);
        Ok(updated)
    }

    /// Current balance of a user for a token (zero when absent)
    #[must_use]
    pub fn balance(&self, user: &UserId, token: &Token) -> Qty {
        self.store
            .balance(&BalanceKey::new(user.clone(), token.clone()))
    }

    /// Execute one swap atomically, retrying bounded times on conflicts
    pub async fn execute_swap(
        &self,
        user: &UserId,
        side: Side,
        amount: Qty,
    ) -> EngineResult<SwapReceipt> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let pair = &self.config.pair;
        let base_key = BalanceKey::new(user.clone(), pair.base.clone());
        let quote_key = BalanceKey::new(user.clone(), pair.quote.clone());

        let max_attempts = self.config.max_commit_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.try_swap_once(user, side, amount, &base_key, &quote_key)? {
                Some(receipt) => {
                    info!(
                        pair = %pair.pair_id,
                        "swap committed: {} {} in, {} out (attempt {})",
                        side, receipt.amount_in, receipt.amount_out, attempt
                    );
                    return Ok(receipt);
                }
                None if attempt < max_attempts => {
                    debug!(
                        pair = %pair.pair_id,
                        "swap conflict on attempt {attempt}/{max_attempts}, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(
                        self.config.retry_backoff_ms * u64::from(attempt),
                    ))
                    .await;
                }
                None => {}
            }
        }

        warn!(pair = %pair.pair_id, "swap gave up after {max_attempts} conflicting attempt(s)");
        Err(EngineError::ConcurrentModification {
            attempts: max_attempts,
        })
    }

    /// One snapshot-quote-commit attempt; `Ok(None)` signals a version
    /// conflict that the caller should retry
    fn try_swap_once(
        &self,
        user: &UserId,
        side: Side,
        amount: Qty,
        base_key: &BalanceKey,
        quote_key: &BalanceKey,
    ) -> EngineResult<Option<SwapReceipt>> {
        let pair = &self.config.pair;
        let snap = self.store.snapshot_swap(&pair.pair_id, base_key, quote_key);
        let pool = snap.pool.clone().ok_or(EngineError::PoolNotInitialized)?;
        let previous_price = pool.spot_price();

        let (quote, new_pool, in_key, in_version, in_balance, out_key, out_version, out_balance) =
            match side {
                Side::Buy => {
                    if snap.base_balance < amount {
                        return Err(EngineError::InsufficientBalance {
                            token: pair.base.clone(),
                            have: snap.base_balance,
                            need: amount,
                        });
                    }
                    let quote = pool::quote_buy(
                        amount,
                        pool.reserve_base,
                        pool.reserve_quote,
                        self.config.fee_bps,
                    )?;
                    let new_pool = PoolState::new(
                        pool.pair.clone(),
                        quote.new_reserve_in,
                        quote.new_reserve_out,
                    );
                    (
                        quote,
                        new_pool,
                        base_key,
                        snap.base_version,
                        snap.base_balance,
                        quote_key,
                        snap.quote_version,
                        snap.quote_balance,
                    )
                }
                Side::Sell => {
                    if snap.quote_balance < amount {
                        return Err(EngineError::InsufficientBalance {
                            token: pair.quote.clone(),
                            have: snap.quote_balance,
                            need: amount,
                        });
                    }
                    let quote = pool::quote_sell(
                        amount,
                        pool.reserve_quote,
                        pool.reserve_base,
                        self.config.fee_bps,
                    )?;
                    let new_pool = PoolState::new(
                        pool.pair.clone(),
                        quote.new_reserve_out,
                        quote.new_reserve_in,
                    );
                    (
                        quote,
                        new_pool,
                        quote_key,
                        snap.quote_version,
                        snap.quote_balance,
                        base_key,
                        snap.base_version,
                        snap.base_balance,
                    )
                }
            };

        let debit_new = in_balance
            .checked_sub(amount)
            .filter(|q| q.as_i64() >= 0)
            .ok_or_else(|| EngineError::InsufficientBalance {
                token: in_key.token.clone(),
                have: in_balance,
                need: amount,
            })?;
        let credit_new = out_balance
            .checked_add(quote.amount_out)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;

        let new_price = new_pool.spot_price();
        let volume_base = match side {
            Side::Buy => amount,
            Side::Sell => quote.amount_out,
        };
        let (token_in, token_out) = match side {
            Side::Buy => (pair.base.clone(), pair.quote.clone()),
            Side::Sell => (pair.quote.clone(), pair.base.clone()),
        };

        let record = TradeRecord {
            user: user.clone(),
            side,
            token_in,
            amount_in: amount,
            token_out,
            amount_out: quote.amount_out,
            rate: Px::from_ratio(quote.amount_out, amount).unwrap_or(Px::ZERO),
            fee_bps: self.config.fee_bps,
            ts: Ts::from_nanos(0), // assigned by the ledger at commit
        };

        let commit = SwapCommit {
            pair: pair.pair_id.clone(),
            pool_version: snap.pool_version,
            new_pool,
            debit_key: in_key.clone(),
            debit_version: in_version,
            debit_new,
            credit_key: out_key.clone(),
            credit_version: out_version,
            credit_new,
        };

        let mut committed: Option<TradeRecord> = None;
        let outcome = self.store.commit_swap(&commit, || {
            committed = Some(self.ledger.append(record)?);
            Ok(())
        })?;

        match outcome {
            CommitOutcome::Conflict => Ok(None),
            CommitOutcome::Committed => {
                let record = committed.expect("persist ran on commit");
                let receipt = SwapReceipt {
                    amount_in: record.amount_in,
                    amount_out: record.amount_out,
                    previous_price,
                    new_price,
                    volume_base,
                    ts: record.ts,
                };
                self.publish_tick(PriceTick {
                    pair: pair.pair_id.clone(),
                    ts: receipt.ts,
                    previous_price,
                    new_price,
                    volume_base,
                });
                Ok(Some(receipt))
            }
        }
    }

    /// Forward a tick to the chart aggregator, best-effort
    ///
    /// A full or closed channel stales the chart; it never affects the
    /// committed trade.
    fn publish_tick(&self, tick: PriceTick) {
        if let Some(tx) = &self.chart_tx {
            if let Err(err) = tx.try_send(tick) {
                warn!(pair = %self.config.pair.pair_id, "chart tick dropped: {err}");
            }
        }
    }

    /// The pair this engine serves
    #[must_use]
    pub fn pair_id(&self) -> &PairId {
        &self.config.pair.pair_id
    }
}
