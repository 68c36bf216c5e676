//! # Helios Portfolio
//!
//! The authoritative owner of account state: cash and per-symbol positions.
//!
//! ## Architectural Principles
//!
//! - **Single writer:** only the execution loop mutates the portfolio, and
//!   only after a fill has been returned by the router. No other component
//!   touches `cash` or positions.
//! - **Arithmetic only:** the accountant performs no I/O and has no failure
//!   modes; every operation is total.
//!
//! ## Public API
//!
//! - `Portfolio`: the in-memory state manager for a trading account.
//! - `DashboardSnapshot`: a read-only view derived from the portfolio and the
//!   latest marks, shaped for an external dashboard.

pub mod accountant;
pub mod dashboard;

pub use accountant::Portfolio;
pub use dashboard::{AssetSummary, DashboardSnapshot};
