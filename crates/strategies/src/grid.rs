use crate::error::StrategyError;
use crate::Strategy;
use async_trait::async_trait;
use configuration::GridParams;
use core_types::{OrderSide, Signal, Tick};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The grid strategy.
///
/// The first tick for a symbol anchors a reference price. Symmetric levels at
/// `anchor * (1 ± spacing * k)` for `k = 1..levels` surround the anchor; the
/// first level the price crosses emits a signal and the grid re-anchors at
/// the crossing price.
pub struct Grid {
    params: GridParams,
    anchors: HashMap<String, Decimal>,
    running: bool,
}

impl Grid {
    pub fn new(params: GridParams) -> Result<Self, StrategyError> {
        if params.levels == 0 {
            return Err(StrategyError::InvalidParameters(
                "levels must be at least 1".to_string(),
            ));
        }
        if params.spacing <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "spacing must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            params,
            anchors: HashMap::new(),
            running: false,
        })
    }
}

#[async_trait]
impl Strategy for Grid {
    fn name(&self) -> &str {
        "grid"
    }

    async fn on_start(&mut self) {
        tracing::info!(strategy = self.name(), "Starting strategy");
        self.running = true;
    }

    async fn on_stop(&mut self) {
        tracing::info!(strategy = self.name(), "Stopping strategy");
        self.running = false;
    }

    async fn on_data(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        if !self.running {
            return Ok(Vec::new());
        }

        let anchor = *self
            .anchors
            .entry(tick.symbol.clone())
            .or_insert(tick.price);

        for level in 1..=self.params.levels {
            let offset = self.params.spacing * Decimal::from(level as u64);
            let buy_level = anchor * (Decimal::ONE - offset);
            let sell_level = anchor * (Decimal::ONE + offset);

            if tick.price <= buy_level {
                tracing::debug!(symbol = %tick.symbol, %anchor, %buy_level, "Grid buy level crossed");
                self.anchors.insert(tick.symbol.clone(), tick.price);
                return Ok(vec![Signal::new(
                    tick.symbol.clone(),
                    OrderSide::Buy,
                    self.params.quantity,
                    Decimal::ONE,
                )]);
            }
            if tick.price >= sell_level {
                tracing::debug!(symbol = %tick.symbol, %anchor, %sell_level, "Grid sell level crossed");
                self.anchors.insert(tick.symbol.clone(), tick.price);
                return Ok(vec![Signal::new(
                    tick.symbol.clone(),
                    OrderSide::Sell,
                    self.params.quantity,
                    Decimal::ONE,
                )]);
            }
        }
        Ok(Vec::new())
    }
}
