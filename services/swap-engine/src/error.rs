//! Swap engine error taxonomy
//!
//! Every rejected operation surfaces one of these stable kinds so callers
//! can tell "retry with a smaller amount" apart from "bug or config".

use services_common::{Qty, Token};
use thiserror::Error;

/// Swap engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pool record does not exist yet
    #[error("pool not initialized")]
    PoolNotInitialized,

    /// Amount is non-positive, non-finite, or out of fixed-point range
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Direction string was neither "buy" nor "sell"
    #[error("invalid direction: {0:?} (expected \"buy\" or \"sell\")")]
    InvalidDirection(String),

    /// Balance too small to cover the requested input amount
    #[error("insufficient {token} balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Input token the user is short of
        token: Token,
        /// Current balance
        have: Qty,
        /// Requested input amount
        need: Qty,
    },

    /// Computed output is zero or a reserve would be drained
    #[error("invalid swap calculation or insufficient liquidity")]
    LiquidityExhausted,

    /// Optimistic commit kept losing the race; retries exhausted
    #[error("pool contention: commit conflicted {attempts} time(s), try again")]
    ConcurrentModification {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Underlying store (ledger journal) unreachable
    #[error("persistence failure: {0}")]
    Persistence(#[from] std::io::Error),

    /// Admin secret mismatch on the pool-init gate
    #[error("forbidden: invalid admin secret")]
    Unauthorized,
}

impl EngineError {
    /// Stable machine-readable kind for API responses
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PoolNotInitialized => "pool_not_initialized",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidDirection(_) => "invalid_direction",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::LiquidityExhausted => "liquidity_exhausted",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::Persistence(_) => "persistence_failure",
            Self::Unauthorized => "unauthorized",
        }
    }
}

/// Convenience result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
