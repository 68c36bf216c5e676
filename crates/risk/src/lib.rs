//! # Helios Risk Gate
//!
//! Validates trade signals against portfolio-wide limits before they reach
//! the order router. The gate is pure: given its limits and the day anchor,
//! `validate` has no side effects and touches no I/O.

pub mod error;
pub mod gate;

pub use error::{RiskError, RiskRejection};
pub use gate::RiskGate;
