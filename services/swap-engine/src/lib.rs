//! Swap Engine Service
//!
//! Transactional core of the exchange:
//! - constant-product pool state and pure quoting
//! - authoritative per-user token balances
//! - atomic swap execution with optimistic-conflict retry
//! - append-only trade ledger with a durable journal
//!
//! Every state mutation flows through [`engine::SwapEngine`]'s commit path;
//! nothing else is allowed to read-modify-write a pool or balance record.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod store;

pub use config::{EngineConfig, PairConfig};
pub use engine::{SwapEngine, SwapReceipt};
pub use error::{EngineError, EngineResult};
pub use ledger::{TradeLedger, TradeRecord};
pub use pool::{PoolState, SwapQuote};
pub use store::{BalanceKey, StateStore};
