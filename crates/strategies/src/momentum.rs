use crate::error::StrategyError;
use crate::Strategy;
use async_trait::async_trait;
use configuration::MomentumParams;
use core_types::{OrderSide, Signal, Tick};
use rust_decimal::prelude::*;
use std::collections::HashMap;
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// Per-symbol sliding-window state.
///
/// The `ta` SMA yields partial averages during warm-up, so we count samples
/// and stay silent until the window is actually full.
struct SymbolWindow {
    sma: Sma,
    samples: usize,
}

/// The sliding-window momentum strategy.
///
/// Once a symbol's window is full, the latest price is compared to the window
/// mean; a relative move beyond the threshold in either direction emits a
/// signal whose confidence is the magnitude of that move.
pub struct Momentum {
    params: MomentumParams,
    windows: HashMap<String, SymbolWindow>,
    running: bool,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::InvalidParameters(
                "window must be at least 2".to_string(),
            ));
        }
        if params.threshold <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "threshold must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            params,
            windows: HashMap::new(),
            running: false,
        })
    }
}

#[async_trait]
impl Strategy for Momentum {
    fn name(&self) -> &str {
        "momentum"
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

        let window_len = self.params.window;
        let window = self
            .windows
            .entry(tick.symbol.clone())
            .or_insert_with(|| SymbolWindow {
                // The window length was validated at construction.
                sma: Sma::new(window_len).unwrap(),
                samples: 0,
            });

        // The `ta` crate uses `f64`. We must convert from our high-precision
        // `Decimal` type; a controlled and accepted precision trade-off.
        let close_f64 = tick
            .price
            .to_f64()
            .ok_or_else(|| StrategyError::Indicator("price not representable as f64".to_string()))?;
        let mean_f64 = window.sma.next(close_f64);
        window.samples += 1;

        if window.samples < window_len {
            return Ok(Vec::new());
        }

        let mean = Decimal::from_f64(mean_f64)
            .ok_or_else(|| StrategyError::Indicator("window mean is not finite".to_string()))?;
        if mean.is_zero() {
            return Ok(Vec::new());
        }

        let delta = (tick.price - mean) / mean;
        tracing::debug!(symbol = %tick.symbol, %mean, %delta, "Momentum evaluation");

        if delta > self.params.threshold {
            return Ok(vec![Signal::new(
                tick.symbol.clone(),
                OrderSide::Buy,
                self.params.quantity,
                delta,
            )]);
        }
        if delta < -self.params.threshold {
            return Ok(vec![Signal::new(
                tick.symbol.clone(),
                OrderSide::Sell,
                self.params.quantity,
                -delta,
            )]);
        }
        Ok(Vec::new())
    }
}
