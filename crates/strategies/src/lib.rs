//! # Helios Strategy Library
//!
//! This crate contains the trading logic for the system. It defines a
//! universal `Strategy` trait and provides several concrete implementations.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   exchanges, routing, or execution. It depends only on `core-types` and
//!   `configuration`.
//! - **Strategy Agnostic Engine:** By using the `Strategy` trait, higher-level
//!   crates like the `backtester` and `engine` can host any strategy without
//!   knowing its internal details.
//! - **Extensibility:** Adding a new strategy involves creating a new module,
//!   implementing the `Strategy` trait, and adding it to the `StrategyId`
//!   enum and `factory`.

// Declare all the modules that constitute this crate.
pub mod error;
pub mod factory;
pub mod grid;
pub mod mean_reversion;
pub mod momentum;

// Re-export the key components to create a clean, public-facing API.
pub use error::StrategyError;
pub use factory::create_strategy;
pub use grid::Grid;
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;

// Re-export StrategyId from core_types
pub use core_types::enums::StrategyId;

use async_trait::async_trait;
use core_types::{Signal, Tick};

/// The lifecycle contract every trading strategy implements.
///
/// `on_data` takes `&mut self` because strategies maintain internal state
/// (price windows, anchors). Each strategy is single-threaded with respect to
/// that state: the execution loop never overlaps two `on_data` calls for the
/// same strategy. `Send + Sync` is required so strategies can be shared with
/// the per-tick fan-out tasks.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// A short, stable identifier used in logs.
    fn name(&self) -> &str;

    /// Marks the strategy running. Until this is called, `on_data` yields no
    /// signals.
    async fn on_start(&mut self);

    /// Marks the strategy stopped.
    async fn on_stop(&mut self);

    /// Evaluates one tick and returns zero or more trade intents.
    async fn on_data(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError>;

    /// Called by the execution loop when `on_data` fails. The strategy stays
    /// registered; this is its chance to observe the failure.
    async fn on_error(&mut self, error: &StrategyError) {
        tracing::error!(strategy = self.name(), %error, "Unhandled strategy error");
    }
}
