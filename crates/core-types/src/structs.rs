use crate::enums::{OrderSide, OrderStatus, OrderType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One trade-price observation for a symbol at a point in time.
///
/// Ticks are produced once at the market-data boundary and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub volume: Option<Decimal>,
}

/// One OHLCV bar for a symbol at a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A strategy's intent to trade, not yet risk-checked.
///
/// Signals are ephemeral: they exist only between the strategy that produced
/// them and the execution loop that either rejects or submits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal_id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// How strongly the strategy believes in this intent, in [0, 1].
    pub confidence: Decimal,
    pub metadata: Option<HashMap<String, Decimal>>,
}

impl Signal {
    /// Convenience constructor for the common no-metadata case.
    pub fn new(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, confidence: Decimal) -> Self {
        Self {
            signal_id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            quantity,
            confidence,
            metadata: None,
        }
    }
}

/// The router's input at the boundary to the exchange backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Attached to the exchange call only for non-MARKET orders; the
    /// simulated backend fills at this price.
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub order_type: OrderType,
}

/// The router's output: what actually happened to an `OrderRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub filled_price: Option<Decimal>,
    /// The backend's response, preserved verbatim for diagnostics.
    pub raw: serde_json::Value,
}

/// Signed quantity and average basis price for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            average_price: Decimal::ZERO,
        }
    }

    /// The position's value at the given mark price.
    pub fn market_value(&self, mark_price: Decimal) -> Decimal {
        self.quantity * mark_price
    }

    pub fn is_open(&self) -> bool {
        !self.quantity.is_zero()
    }
}

/// Typed container handed to the history store after a fill is booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}
