use thiserror::Error;

/// Construction-time failures. These are fatal: a gate with nonsensical
/// limits must never be allowed to validate signals.
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Risk limits from configuration are invalid: {0}")]
    InvalidLimits(String),
}

/// Why a signal was turned away. Not an error in the failure sense: a
/// rejection is a normal outcome of a healthy gate, and the loop simply
/// discards the signal. The Display strings are part of the contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRejection {
    #[error("Missing mark price")]
    MissingMark,

    #[error("Position size exceeds risk limit")]
    PositionSizeExceeded,

    #[error("Maximum concurrent positions reached")]
    MaxPositionsReached,

    #[error("Daily loss limit breached")]
    DailyLossBreached,
}
