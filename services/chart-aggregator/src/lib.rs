//! Chart Aggregator Service
//!
//! Consumes price ticks published by the swap engine and maintains OHLCV
//! candle rings per (pair, timeframe):
//! - fixed bucket boundaries (`floor(ts / width) * width`)
//! - flat zero-volume candles backfill gaps between trades
//! - bounded retention (oldest candles evicted past the ring capacity)
//!
//! The aggregator is a best-effort read model: it never feeds back into
//! swap execution, and a dropped tick only stales the chart.

pub mod config;

pub use config::ChartConfig;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{PairId, PriceTick, Px, Qty, Ts};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Timeframe for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute bars
    M1,
    /// 5 minute bars
    M5,
    /// 15 minute bars
    M15,
    /// 30 minute bars
    M30,
    /// 1 hour bars
    H1,
    /// 4 hour bars
    H4,
    /// Daily bars
    D1,
}

impl Timeframe {
    /// Get bucket width in seconds
    #[must_use]
    pub const fn duration_seconds(&self) -> u64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1800,
            Self::H1 => 3600,
            Self::H4 => 14400,
            Self::D1 => 86400,
        }
    }

    /// Bucket start for a timestamp, in whole seconds
    #[must_use]
    pub const fn bucket_start(&self, ts: Ts) -> u64 {
        let width = self.duration_seconds();
        ts.as_secs() / width * width
    }
}

/// OHLCV candle data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, in whole seconds since epoch
    pub open_time: u64,
    /// Open price
    pub open: Px,
    /// High price
    pub high: Px,
    /// Low price
    pub low: Px,
    /// Close price
    pub close: Px,
    /// Volume in base-token terms
    pub volume: Qty,
    /// Number of trades merged into this candle
    pub trades: u32,
}

impl Candle {
    /// Flat candle at a single price, carrying no volume
    #[must_use]
    pub const fn flat(open_time: u64, price: Px) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Qty::ZERO,
            trades: 0,
        }
    }

    /// Merge one tick into this candle
    ///
    /// The high/low envelope covers both sides of the price move so that a
    /// wick is never lost to intra-bucket ordering. Zero-volume seed ticks
    /// move the price without counting as trades.
    fn merge(&mut self, tick: &PriceTick) {
        self.high = self.high.max(tick.new_price).max(tick.previous_price);
        self.low = self.low.min(tick.new_price).min(tick.previous_price);
        self.close = tick.new_price;
        self.volume = self
            .volume
            .checked_add(tick.volume_base)
            .unwrap_or(self.volume);
        if tick.volume_base.is_positive() {
            self.trades += 1;
        }
    }
}

struct Ring {
    candles: VecDeque<Candle>,
}

impl Ring {
    const fn new() -> Self {
        Self {
            candles: VecDeque::new(),
        }
    }
}

/// Maintains candle rings for every (pair, timeframe) combination
pub struct ChartAggregator {
    config: ChartConfig,
    rings: RwLock<FxHashMap<(PairId, Timeframe), Ring>>,
}

impl ChartAggregator {
    /// Create a new aggregator
    #[must_use]
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            rings: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create the tick channel this aggregator is sized for
    #[must_use]
    pub fn channel(&self) -> (mpsc::Sender<PriceTick>, mpsc::Receiver<PriceTick>) {
        mpsc::channel(self.config.channel_capacity)
    }

    /// Apply one tick across all configured timeframes
    pub fn apply_tick(&self, tick: &PriceTick) {
        let mut rings = self.rings.write();
        for &timeframe in &self.config.timeframes {
            let ring = rings
                .entry((tick.pair.clone(), timeframe))
                .or_insert_with(Ring::new);
            self.update_ring(ring, timeframe, tick);
        }
    }

    fn update_ring(&self, ring: &mut Ring, timeframe: Timeframe, tick: &PriceTick) {
        let width = timeframe.duration_seconds();
        let bucket = timeframe.bucket_start(tick.ts);

        match ring.candles.back_mut() {
            None => {
                ring.candles
                    .push_back(Candle::flat(bucket, tick.previous_price));
                ring.candles
                    .back_mut()
                    .expect("just pushed")
                    .merge(tick);
            }
            Some(last) if last.open_time == bucket => {
                last.merge(tick);
            }
            Some(last) if last.open_time < bucket => {
                // Quiet buckets between the last candle and this tick get a
                // flat candle at the standing price, bounded to the buckets
                // the ring could actually retain.
                let fill_price = last.close;
                let mut next = last.open_time + width;
                let horizon = (self.config.max_candles as u64)
                    .saturating_sub(1)
                    .saturating_mul(width);
                let first_retained = bucket.saturating_sub(horizon);
                if next < first_retained {
                    debug!(
                        pair = %tick.pair,
                        ?timeframe,
                        skipped = (first_retained - next) / width,
                        "gap exceeds ring retention; skipping unreachable buckets"
                    );
                    next = first_retained;
                }
                while next < bucket {
                    ring.candles.push_back(Candle::flat(next, fill_price));
                    next += width;
                }
                ring.candles.push_back(Candle::flat(bucket, fill_price));
                ring.candles
                    .back_mut()
                    .expect("just pushed")
                    .merge(tick);
            }
            Some(last) => {
                // A tick for an already-closed bucket would rewrite history;
                // the chart is a read model, so it is dropped.
                warn!(
                    pair = %tick.pair,
                    ?timeframe,
                    tick_bucket = bucket,
                    open_bucket = last.open_time,
                    "late tick for closed bucket dropped"
                );
                return;
            }
        }

        while ring.candles.len() > self.config.max_candles {
            ring.candles.pop_front();
        }
    }

    /// All retained candles for a pair and timeframe, oldest first
    #[must_use]
    pub fn candles(&self, pair: &PairId, timeframe: Timeframe) -> Vec<Candle> {
        self.rings
            .read()
            .get(&(pair.clone(), timeframe))
            .map(|ring| ring.candles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Last `n` candles for a pair and timeframe, oldest first
    #[must_use]
    pub fn recent(&self, pair: &PairId, timeframe: Timeframe, n: usize) -> Vec<Candle> {
        self.rings
            .read()
            .get(&(pair.clone(), timeframe))
            .map(|ring| {
                let start = ring.candles.len().saturating_sub(n);
                ring.candles.iter().skip(start).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Currently open candle for a pair and timeframe
    #[must_use]
    pub fn latest(&self, pair: &PairId, timeframe: Timeframe) -> Option<Candle> {
        self.rings
            .read()
            .get(&(pair.clone(), timeframe))
            .and_then(|ring| ring.candles.back().cloned())
    }

    /// Drain the tick channel until the sender side closes
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<PriceTick>) {
        info!("chart aggregator started");
        while let Some(tick) = rx.recv().await {
            self.apply_tick(&tick);
        }
        info!("chart aggregator stopped: tick channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts_secs: u64, prev: f64, new: f64, volume: f64) -> PriceTick {
        PriceTick {
            pair: PairId::new("PSNG_SOL"),
            ts: Ts::from_secs(ts_secs),
            previous_price: Px::checked_from_f64(prev).expect("finite"),
            new_price: Px::checked_from_f64(new).expect("finite"),
            volume_base: Qty::checked_from_f64(volume).expect("finite"),
        }
    }

    fn aggregator() -> ChartAggregator {
        ChartAggregator::new(ChartConfig::default())
    }

    #[test]
    fn test_first_tick_opens_at_previous_price() {
        let agg = aggregator();
        agg.apply_tick(&tick(10, 5.0, 6.0, 2.0));

        let pair = PairId::new("PSNG_SOL");
        let candle = agg.latest(&pair, Timeframe::M1).expect("candle");
        assert_eq!(candle.open_time, 0);
        assert_eq!(candle.open, Px::checked_from_f64(5.0).unwrap());
        assert_eq!(candle.close, Px::checked_from_f64(6.0).unwrap());
        assert_eq!(candle.high, Px::checked_from_f64(6.0).unwrap());
        assert_eq!(candle.low, Px::checked_from_f64(5.0).unwrap());
        assert_eq!(candle.trades, 1);
    }

    #[test]
    fn test_same_bucket_merges() {
        let agg = aggregator();
        agg.apply_tick(&tick(0, 5.0, 6.0, 1.0));
        agg.apply_tick(&tick(30, 6.0, 4.0, 3.0));

        let pair = PairId::new("PSNG_SOL");
        let candles = agg.candles(&pair, Timeframe::M1);
        assert_eq!(candles.len(), 1);
        let candle = &candles[0];
        assert_eq!(candle.high, Px::checked_from_f64(6.0).unwrap());
        assert_eq!(candle.low, Px::checked_from_f64(4.0).unwrap());
        assert_eq!(candle.close, Px::checked_from_f64(4.0).unwrap());
        assert_eq!(candle.volume, Qty::checked_from_f64(4.0).unwrap());
        assert_eq!(candle.trades, 2);
    }

    #[test]
    fn test_seed_tick_moves_price_without_counting_a_trade() {
        let agg = aggregator();
        agg.apply_tick(&tick(0, 5.0, 5.0, 0.0));

        let pair = PairId::new("PSNG_SOL");
        let candle = agg.latest(&pair, Timeframe::M1).expect("candle");
        assert_eq!(candle.trades, 0);
        assert!(candle.volume.is_zero());
        assert_eq!(candle.close, Px::checked_from_f64(5.0).unwrap());
    }

    #[test]
    fn test_late_tick_for_closed_bucket_is_dropped() {
        let agg = aggregator();
        agg.apply_tick(&tick(120, 5.0, 6.0, 1.0));
        agg.apply_tick(&tick(30, 6.0, 9.0, 1.0));

        let pair = PairId::new("PSNG_SOL");
        let candles = agg.candles(&pair, Timeframe::M1);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open_time, 120);
        assert_eq!(candles[0].close, Px::checked_from_f64(6.0).unwrap());
    }

    #[test]
    fn test_ring_evicts_past_capacity() {
        let config = ChartConfig {
            timeframes: vec![Timeframe::M1],
            max_candles: 3,
            ..ChartConfig::default()
        };
        let agg = ChartAggregator::new(config);
        for i in 0..5u64 {
            agg.apply_tick(&tick(i * 60, 5.0, 5.0 + i as f64, 1.0));
        }

        let pair = PairId::new("PSNG_SOL");
        let candles = agg.candles(&pair, Timeframe::M1);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].open_time, 120);
        assert_eq!(candles[2].open_time, 240);
    }

    #[test]
    fn test_huge_gap_does_not_backfill_past_retention() {
        let config = ChartConfig {
            timeframes: vec![Timeframe::M1],
            max_candles: 5,
            ..ChartConfig::default()
        };
        let agg = ChartAggregator::new(config);
        agg.apply_tick(&tick(0, 5.0, 5.0, 1.0));
        // A year later; only the last 5 buckets are worth materializing
        agg.apply_tick(&tick(31_536_000, 5.0, 7.0, 1.0));

        let pair = PairId::new("PSNG_SOL");
        let candles = agg.candles(&pair, Timeframe::M1);
        assert_eq!(candles.len(), 5);
        assert_eq!(candles[4].open_time, 31_536_000);
        assert_eq!(candles[4].close, Px::checked_from_f64(7.0).unwrap());
        // Filler candles hold the standing price with zero volume
        assert_eq!(candles[0].close, Px::checked_from_f64(5.0).unwrap());
        assert!(candles[0].volume.is_zero());
    }
}
