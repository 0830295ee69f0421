//! Core value types for the `flowdex` trading services
//!
//! All token quantities and exchange rates are fixed-point integers for
//! determinism; `f64` appears only at the external API boundary.

use crate::constants::fixed_point::{SCALE_4, SCALE_12};
use crate::constants::time::{NANOS_PER_MICRO, NANOS_PER_MILLI, NANOS_PER_SEC};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trusted user identifier handed to the core by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token symbol (e.g. `SOL`, `PSNG`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    /// Create a new token symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Get the symbol as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trading-pair identifier (e.g. `PSNG_SOL`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(String);

impl PairId {
    /// Create a new pair identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trade direction as submitted by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Spend base token, receive quote token
    Buy,
    /// Spend quote token, receive base token
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// Error returned when parsing an unknown trade direction
#[derive(Debug, Clone, Error)]
#[error("invalid direction: {0:?} (expected \"buy\" or \"sell\")")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(ParseSideError(other.to_string())),
        }
    }
}

/// Token quantity (stored as i64 ticks for determinism, 4 decimal places)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qty(i64); // Internal: quantity in ticks (1 tick = 0.0001)

impl Qty {
    /// Zero quantity
    pub const ZERO: Self = Self(0);

    /// Create from i64 ticks
    #[must_use]
    pub const fn from_i64(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Create from whole token units
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * SCALE_4)
    }

    /// Convert an external `f64` amount, rejecting non-finite values and
    /// values outside the representable tick range
    #[must_use]
    pub fn checked_from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * SCALE_4 as f64).round();
        // i64::MAX is not exactly representable as f64; bound strictly
        if scaled >= 9_223_372_036_854_775_807.0 || scaled <= -9_223_372_036_854_775_808.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(Self(scaled as i64))
    }

    /// Get quantity as i64 ticks
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Get quantity as f64 for external APIs only
    ///
    /// Internal code always stays in fixed point; this single conversion
    /// exists for the JSON boundary.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f64 / SCALE_4 as f64
        }
    }

    /// Check if quantity is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if quantity is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Add two quantities
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Subtract two quantities
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    /// Checked addition in ticks
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction in ticks
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE_4;
        let frac = (self.0 % SCALE_4).abs();
        write!(f, "{whole}.{frac:04}")
    }
}

/// Exchange rate (stored as i64 ticks for determinism, 12 decimal places)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Px(i64); // Internal: rate in ticks (1 tick = 1e-12)

impl Px {
    /// Zero rate
    pub const ZERO: Self = Self(0);

    /// Create from i64 ticks
    #[must_use]
    pub const fn from_i64(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Rate of `numerator / denominator` quantities, rounded down
    ///
    /// Returns `None` when the denominator is zero or the rate overflows.
    #[must_use]
    pub fn from_ratio(numerator: Qty, denominator: Qty) -> Option<Self> {
        if denominator.as_i64() == 0 {
            return None;
        }
        let scaled = i128::from(numerator.as_i64()) * i128::from(SCALE_12)
            / i128::from(denominator.as_i64());
        i64::try_from(scaled).ok().map(Self)
    }

    /// Convert an external `f64` rate, rejecting non-finite values
    #[must_use]
    pub fn checked_from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * SCALE_12 as f64).round();
        if scaled >= 9_223_372_036_854_775_807.0 || scaled <= -9_223_372_036_854_775_808.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(Self(scaled as i64))
    }

    /// Get rate as i64 ticks
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Get rate as f64 for external APIs only
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        {
            self.0 as f64 / SCALE_12 as f64
        }
    }

    /// Check if rate is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiply a quantity by this rate, rounding down
    ///
    /// Used for `total = amount * price` on limit orders.
    #[must_use]
    pub fn mul_qty(self, qty: Qty) -> Option<Qty> {
        let scaled = i128::from(self.0) * i128::from(qty.as_i64()) / i128::from(SCALE_12);
        i64::try_from(scaled).ok().map(Qty::from_i64)
    }

    /// Maximum of two rates
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 { self } else { other }
    }

    /// Minimum of two rates
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE_12;
        let frac = (self.0 % SCALE_12).abs();
        write!(f, "{whole}.{frac:012}")
    }
}

/// Timestamp in nanoseconds since UNIX epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ts(pub u64);

impl Ts {
    /// Get current timestamp
    #[must_use]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));
        let nanos = duration.as_secs() * NANOS_PER_SEC + u64::from(duration.subsec_nanos());
        Self(nanos)
    }

    /// Create timestamp from nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create timestamp from whole seconds
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * NANOS_PER_SEC)
    }

    /// Create timestamp from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Get timestamp as nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Get timestamp as microseconds
    #[must_use]
    pub const fn as_micros(&self) -> u64 {
        self.0 / NANOS_PER_MICRO
    }

    /// Get timestamp as milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }

    /// Get timestamp as whole seconds
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0 / NANOS_PER_SEC
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
