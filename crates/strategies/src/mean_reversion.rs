use crate::error::StrategyError;
use crate::Strategy;
use async_trait::async_trait;
use configuration::MeanReversionParams;
use core_types::{OrderSide, Signal, Tick};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

struct SymbolWindow {
    sma: Sma,
    samples: usize,
}

/// The mean-reversion strategy.
///
/// Uses a fixed fraction (1%) of the window mean as a deviation proxy rather
/// than a true standard deviation; the z-score against that proxy decides
/// whether price has stretched far enough from the mean to fade.
pub struct MeanReversion {
    params: MeanReversionParams,
    windows: HashMap<String, SymbolWindow>,
    running: bool,
}

/// Floor for the deviation proxy so a near-zero mean cannot blow up the z-score.
const MIN_DEVIATION: Decimal = dec!(0.000001);

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Result<Self, StrategyError> {
        if params.window < 2 {
            return Err(StrategyError::InvalidParameters(
                "window must be at least 2".to_string(),
            ));
        }
        if params.z_threshold <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "z_threshold must be greater than 0".to_string(),
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
impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
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
                sma: Sma::new(window_len).unwrap(),
                samples: 0,
            });

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
        let deviation = (mean * dec!(0.01)).max(MIN_DEVIATION);
        let z_value = (tick.price - mean) / deviation;
        tracing::debug!(symbol = %tick.symbol, %mean, %z_value, "Mean-reversion evaluation");

        let confidence = z_value.abs().min(Decimal::ONE);
        if z_value > self.params.z_threshold {
            return Ok(vec![Signal::new(
                tick.symbol.clone(),
                OrderSide::Sell,
                self.params.quantity,
                confidence,
            )]);
        }
        if z_value < -self.params.z_threshold {
            return Ok(vec![Signal::new(
                tick.symbol.clone(),
                OrderSide::Buy,
                self.params.quantity,
                confidence,
            )]);
        }
        Ok(Vec::new())
    }
}
