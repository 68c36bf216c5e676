use crate::error::{RiskError, RiskRejection};
use configuration::RiskLimits;
use core_types::Signal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};

/// Validates each signal against portfolio-wide limits.
///
/// The checks run in a fixed priority order so that a signal failing several
/// limits at once always reports the same reason.
#[derive(Debug, Clone)]
pub struct RiskGate {
    limits: RiskLimits,
    day_anchor: Option<Decimal>,
}

impl RiskGate {
    /// Creates a new gate, validating the limit parameters.
    pub fn new(limits: RiskLimits) -> Result<Self, RiskError> {
        if limits.max_position_pct <= dec!(0) || limits.max_position_pct > dec!(1) {
            return Err(RiskError::InvalidLimits(
                "max_position_pct must be in (0, 1]".to_string(),
            ));
        }
        if limits.max_daily_loss_pct <= dec!(0) || limits.max_daily_loss_pct >= dec!(1) {
            return Err(RiskError::InvalidLimits(
                "max_daily_loss_pct must be in (0, 1)".to_string(),
            ));
        }
        if limits.max_positions == 0 {
            return Err(RiskError::InvalidLimits(
                "max_positions must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            limits,
            day_anchor: None,
        })
    }

    /// Captures the reference equity for the daily drawdown check. Until this
    /// is called the drawdown check is skipped.
    pub fn reset_day(&mut self, anchor_equity: Decimal) {
        self.day_anchor = Some(anchor_equity);
    }

    /// Checks one signal against the limits.
    ///
    /// `open_symbols` is the set of symbols currently held with a non-zero
    /// quantity; the caller snapshots it together with `equity` so both views
    /// are from the same instant.
    pub fn validate(
        &self,
        signal: &Signal,
        marks: &HashMap<String, Decimal>,
        equity: Decimal,
        open_symbols: &HashSet<String>,
    ) -> Result<(), RiskRejection> {
        let mark = marks
            .get(&signal.symbol)
            .copied()
            .ok_or(RiskRejection::MissingMark)?;

        let target_notional = signal.quantity.abs() * mark;
        if target_notional > equity * self.limits.max_position_pct {
            return Err(RiskRejection::PositionSizeExceeded);
        }

        if !open_symbols.contains(&signal.symbol)
            && open_symbols.len() >= self.limits.max_positions
        {
            return Err(RiskRejection::MaxPositionsReached);
        }

        if let Some(anchor) = self.day_anchor {
            if anchor > Decimal::ZERO {
                let drawdown = Decimal::ONE - equity / anchor;
                if drawdown > self.limits.max_daily_loss_pct {
                    return Err(RiskRejection::DailyLossBreached);
                }
            }
        }

        Ok(())
    }
}
