//! # Helios Core Types
//!
//! This crate defines the shared data structures that flow between every layer
//! of the system: market data in, trade intents through the risk gate, order
//! requests out, and fills back into the portfolio.
//!
//! As a Layer 0 crate it has no knowledge of exchanges, storage, or execution.
//! Every other crate in the workspace depends on it.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Interval, OrderSide, OrderStatus, OrderType, StrategyId};
pub use error::CoreError;
pub use structs::{Candle, OrderRecord, OrderRequest, OrderResult, Position, Signal, Tick};
