//! Core constants for the `flowdex` trading services.
//!
//! Centralizes the fixed-point scales and time conversions used across the
//! swap engine and aggregators so no crate hard-codes its own magic numbers.

/// Fixed-point arithmetic constants
pub mod fixed_point {
    /// 4-decimal fixed-point scale factor (token quantities, reserves)
    pub const SCALE_4: i64 = 10_000;

    /// 12-decimal fixed-point scale factor (exchange rates)
    ///
    /// AMM spot prices (`reserve_base / reserve_quote`) for pools with a
    /// large quote supply sit far below one base token per quote token, so
    /// rates carry more fractional resolution than quantities.
    pub const SCALE_12: i64 = 1_000_000_000_000;

    /// Basis-point denominator (1 bp = 1/100th of a percent)
    pub const BASIS_POINTS: i64 = 10_000;
}

/// Time-related constants
pub mod time {
    /// Seconds per minute
    pub const SECS_PER_MINUTE: u64 = 60;

    /// Seconds per hour
    pub const SECS_PER_HOUR: u64 = 3_600;

    /// Seconds per day
    pub const SECS_PER_DAY: u64 = 86_400;

    /// Nanoseconds per second
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;

    /// Nanoseconds per millisecond
    pub const NANOS_PER_MILLI: u64 = 1_000_000;

    /// Nanoseconds per microsecond
    pub const NANOS_PER_MICRO: u64 = 1_000;
}
