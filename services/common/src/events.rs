//! Cross-service event types
//!
//! The swap engine publishes one [`PriceTick`] per committed trade (and one
//! zero-volume tick when a pool is initialized); the chart aggregator
//! consumes them. Delivery is best-effort by contract: a dropped tick stales
//! the chart, never the ledger.

use crate::types::{PairId, Px, Qty, Ts};
use serde::{Deserialize, Serialize};

/// Price movement produced by a committed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Trading pair the tick belongs to
    pub pair: PairId,
    /// Commit timestamp of the trade
    pub ts: Ts,
    /// Spot price before the trade
    pub previous_price: Px,
    /// Spot price after the trade
    pub new_price: Px,
    /// Trade volume in base-token terms (zero for a pool-init seed tick)
    pub volume_base: Qty,
}
