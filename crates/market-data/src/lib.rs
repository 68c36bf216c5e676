//! # Helios Market Data
//!
//! Produces the system's market inputs behind one contract, two sources:
//!
//! - `MarketFeed` yields an infinite, lazy sequence of `Tick`s: from the
//!   exchange's multiplexed ticker stream when credentials are configured,
//!   or from a bounded per-symbol random walk when they are not. Either way
//!   the ticks arrive through a single-consumer channel fed by a background
//!   task.
//! - `HistoricalDataService` returns finite, chronologically ordered candle
//!   series for backtesting, from a `HistoryStore` when one has data and
//!   synthesized with the same walk otherwise.

pub mod error;
pub mod feed;
pub mod history;
pub mod synthetic;

pub use error::MarketDataError;
pub use feed::{FeedHandle, MarketFeed};
pub use history::{HistoricalDataService, HistoryStore, MemoryHistoryStore};
pub use synthetic::SyntheticWalk;
