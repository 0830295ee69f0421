//! Order intake errors

use thiserror::Error;

/// Errors produced while accepting a limit order
#[derive(Debug, Error)]
pub enum OrderError {
    /// Amount was zero, negative, or not a finite number
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Price was zero, negative, or not a finite number
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Direction string was neither "buy" nor "sell"
    #[error("invalid direction: {0:?}")]
    InvalidDirection(String),

    /// `amount * price` exceeded the representable quantity range
    #[error("order total overflows the representable range")]
    TotalOverflow,
}

impl OrderError {
    /// Stable machine-readable error kind for API responses
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidPrice(_) => "invalid_price",
            Self::InvalidDirection(_) => "invalid_direction",
            Self::TotalOverflow => "total_overflow",
        }
    }
}

/// Result alias for order intake
pub type OrderResult<T> = Result<T, OrderError>;
