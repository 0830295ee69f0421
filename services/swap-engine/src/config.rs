//! Swap engine configuration

use serde::{Deserialize, Serialize};
use services_common::{PairId, Token};

/// Environment variable overriding the pool-init admin secret
pub const POOL_INIT_SECRET_ENV: &str = "POOL_INIT_SECRET";

/// Trading pair the engine serves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfig {
    /// Pool record key
    pub pair_id: PairId,

    /// Base token (reserve numerator of the spot price)
    pub base: Token,

    /// Quote token (reserve denominator of the spot price)
    pub quote: Token,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            pair_id: PairId::new("PSNG_SOL"),
            base: Token::new("SOL"),
            quote: Token::new("PSNG"),
        }
    }
}

/// Swap engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trading pair served by this engine instance
    pub pair: PairConfig,

    /// Swap fee in basis points (200 = 2%)
    pub fee_bps: u16,

    /// Maximum optimistic-commit attempts before surfacing contention
    pub max_commit_attempts: u32,

    /// Linear backoff step between commit attempts, in milliseconds
    pub retry_backoff_ms: u64,

    /// Shared secret gating pool initialization
    pub admin_secret: String,

    /// Capacity of the chart tick channel
    pub chart_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pair: PairConfig::default(),
            fee_bps: 200,
            max_commit_attempts: 5,
            retry_backoff_ms: 2,
            admin_secret: "MY_SECRET".to_string(),
            chart_channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Default configuration with the admin secret taken from the
    /// environment when present
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(secret) = std::env::var(POOL_INIT_SECRET_ENV) {
            config.admin_secret = secret;
        }
        config
    }
}
