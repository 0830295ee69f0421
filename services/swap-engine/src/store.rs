//! Versioned state store with optimistic concurrency
//!
//! Pool and balance records each carry a version counter. A swap reads a
//! consistent snapshot (values plus versions) under the read lock, computes
//! its quote off-lock, then commits under the write lock, which re-validates
//! every version it read before applying any write. A mismatch means a
//! concurrent commit touched one of the keys; the caller retries from a
//! fresh snapshot.
//!
//! Absent keys validate as version 0, so lazily-created balance records
//! participate in conflict detection like any other key.

use crate::error::{EngineError, EngineResult};
use crate::pool::PoolState;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use services_common::{PairId, Qty, Token, UserId};
use tracing::debug;

/// Version counter attached to every record
pub type Version = u64;

/// Key of a per-user, per-token balance record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    /// Owning user
    pub user: UserId,
    /// Token symbol
    pub token: Token,
}

impl BalanceKey {
    /// Create a balance key
    #[must_use]
    pub fn new(user: UserId, token: Token) -> Self {
        Self { user, token }
    }
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: Version,
    value: T,
}

#[derive(Debug, Default)]
struct Inner {
    pools: FxHashMap<PairId, Versioned<PoolState>>,
    balances: FxHashMap<BalanceKey, Versioned<Qty>>,
}

/// Consistent snapshot of everything a swap touches
#[derive(Debug, Clone)]
pub struct SwapSnapshot {
    /// Pool state, if initialized
    pub pool: Option<PoolState>,
    /// Version of the pool record (0 when absent)
    pub pool_version: Version,
    /// Base-token balance of the user (0 when absent)
    pub base_balance: Qty,
    /// Version of the base balance record
    pub base_version: Version,
    /// Quote-token balance of the user (0 when absent)
    pub quote_balance: Qty,
    /// Version of the quote balance record
    pub quote_version: Version,
}

/// Full write set of one swap, tied to the versions it was computed from
#[derive(Debug, Clone)]
pub struct SwapCommit {
    /// Pool key
    pub pair: PairId,
    /// Pool version the quote was computed against
    pub pool_version: Version,
    /// Post-trade pool state
    pub new_pool: PoolState,
    /// Debited balance key
    pub debit_key: BalanceKey,
    /// Version of the debited balance at snapshot time
    pub debit_version: Version,
    /// New value of the debited balance
    pub debit_new: Qty,
    /// Credited balance key
    pub credit_key: BalanceKey,
    /// Version of the credited balance at snapshot time
    pub credit_version: Version,
    /// New value of the credited balance
    pub credit_new: Qty,
}

/// Outcome of an optimistic commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// All writes applied
    Committed,
    /// A touched key was concurrently modified; retry from a fresh snapshot
    Conflict,
}

/// In-memory versioned store for pool and balance records
#[derive(Debug, Default)]
pub struct StateStore {
    inner: RwLock<Inner>,
}

impl StateStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the pool and the two user balances as one consistent snapshot
    #[must_use]
    pub fn snapshot_swap(
        &self,
        pair: &PairId,
        base_key: &BalanceKey,
        quote_key: &BalanceKey,
    ) -> SwapSnapshot {
        let inner = self.inner.read();
        let (pool, pool_version) = match inner.pools.get(pair) {
            Some(v) => (Some(v.value.clone()), v.version),
            None => (None, 0),
        };
        let (base_balance, base_version) = match inner.balances.get(base_key) {
            Some(v) => (v.value, v.version),
            None => (Qty::ZERO, 0),
        };
        let (quote_balance, quote_version) = match inner.balances.get(quote_key) {
            Some(v) => (v.value, v.version),
            None => (Qty::ZERO, 0),
        };
        SwapSnapshot {
            pool,
            pool_version,
            base_balance,
            base_version,
            quote_balance,
            quote_version,
        }
    }

    /// Atomically apply one swap's write set if no touched key changed since
    /// the snapshot
    ///
    /// `persist` runs inside the critical section after validation and
    /// before any in-memory write (write-ahead). If it fails, the commit
    /// aborts with no state change.
    pub fn commit_swap<F>(&self, commit: &SwapCommit, persist: F) -> EngineResult<CommitOutcome>
    where
        F: FnOnce() -> EngineResult<()>,
    {
        let mut inner = self.inner.write();

        let pool_current = inner.pools.get(&commit.pair).map_or(0, |v| v.version);
        let debit_current = inner.balances.get(&commit.debit_key).map_or(0, |v| v.version);
        let credit_current = inner
            .balances
            .get(&commit.credit_key)
            .map_or(0, |v| v.version);

        if pool_current != commit.pool_version
            || debit_current != commit.debit_version
            || credit_current != commit.credit_version
        {
            debug!(
                pair = %commit.pair,
                "commit conflict: pool v{pool_current} (read v{}), balances v{debit_current}/v{credit_current}",
                commit.pool_version
            );
            return Ok(CommitOutcome::Conflict);
        }

        persist()?;

        inner.pools.insert(
            commit.pair.clone(),
            Versioned {
                version: pool_current + 1,
                value: commit.new_pool.clone(),
            },
        );
        inner.balances.insert(
            commit.debit_key.clone(),
            Versioned {
                version: debit_current + 1,
                value: commit.debit_new,
            },
        );
        inner.balances.insert(
            commit.credit_key.clone(),
            Versioned {
                version: credit_current + 1,
                value: commit.credit_new,
            },
        );

        Ok(CommitOutcome::Committed)
    }

    /// Credit a balance outside the swap path (deposit detection, admin
    /// seeding); single-key atomic write
    pub fn credit(&self, key: &BalanceKey, delta: Qty) -> EngineResult<Qty> {
        let mut inner = self.inner.write();
        let (version, current) = inner
            .balances
            .get(key)
            .map_or((0, Qty::ZERO), |v| (v.version, v.value));
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        inner.balances.insert(
            key.clone(),
            Versioned {
                version: version + 1,
                value: updated,
            },
        );
        Ok(updated)
    }

    /// Current balance, defaulting to zero for absent records
    #[must_use]
    pub fn balance(&self, key: &BalanceKey) -> Qty {
        self.inner
            .read()
            .balances
            .get(key)
            .map_or(Qty::ZERO, |v| v.value)
    }

    /// Current pool state, if initialized
    #[must_use]
    pub fn pool(&self, pair: &PairId) -> Option<PoolState> {
        self.inner.read().pools.get(pair).map(|v| v.value.clone())
    }

    /// Create or replace the pool record (admin-gated upstream)
    pub fn init_pool(&self, pool: PoolState) {
        let mut inner = self.inner.write();
        let version = inner.pools.get(&pool.pair).map_or(0, |v| v.version);
        inner.pools.insert(
            pool.pair.clone(),
            Versioned {
                version: version + 1,
                value: pool,
            },
        );
    }
}
