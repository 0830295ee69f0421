//! Shared value types and constants for the `flowdex` services

pub mod constants;
pub mod events;
pub mod types;

pub use constants::*;
pub use events::*;
pub use types::*;
