//! Chart aggregator configuration

use crate::Timeframe;
use serde::{Deserialize, Serialize};

/// Chart aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Timeframes maintained simultaneously for every pair
    pub timeframes: Vec<Timeframe>,

    /// Maximum candles retained per (pair, timeframe) ring
    pub max_candles: usize,

    /// Capacity of the inbound tick channel
    pub channel_capacity: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            timeframes: vec![
                Timeframe::M1,
                Timeframe::M5,
                Timeframe::M15,
                Timeframe::M30,
                Timeframe::H1,
                Timeframe::H4,
                Timeframe::D1,
            ],
            max_candles: 200,
            channel_capacity: 1024,
        }
    }
}
