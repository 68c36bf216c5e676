//! # Helios Order Router
//!
//! Owns the path from an approved `OrderRequest` to an `OrderResult`. The
//! router holds exactly one of two backends, chosen at construction:
//!
//! - **Live**: translates the request into an authenticated exchange call via
//!   an `ExchangeGateway` and parses the exchange's fill report.
//! - **Simulated**: fills instantly at the request's limit price with a
//!   monotonically increasing order id. No I/O.
//!
//! Callers never observe which backend is active. The router never retries:
//! a rejection is final and retry policy belongs to the caller.

pub mod auth;
pub mod error;
pub mod gateway;

pub use error::{GatewayError, RouterError};
pub use gateway::{BinanceGateway, CreateOrderParams, CreateOrderResponse, ExchangeGateway};

use async_trait::async_trait;
use configuration::ExchangeConfig;
use core_types::{OrderRequest, OrderResult, OrderStatus, OrderType};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A backend that can turn an `OrderRequest` into an `OrderResult`.
#[async_trait]
pub trait RouterBackend: Send + Sync {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, RouterError>;
}

/// The no-I/O backend: every order fills in full at its limit price.
pub struct SimulatedBackend {
    next_id: Mutex<u64>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(0),
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouterBackend for SimulatedBackend {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, RouterError> {
        let order_id = {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            format!("sim-{}", *next_id)
        };

        Ok(OrderResult {
            order_id,
            status: OrderStatus::Filled,
            filled_quantity: request.quantity,
            filled_price: request.limit_price,
            raw: json!({ "simulated": true }),
        })
    }
}

/// The live backend: forwards to an exchange gateway and normalizes its
/// response.
pub struct LiveBackend {
    gateway: Arc<dyn ExchangeGateway>,
    recv_window: u64,
}

impl LiveBackend {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, recv_window: u64) -> Self {
        Self {
            gateway,
            recv_window,
        }
    }
}

#[async_trait]
impl RouterBackend for LiveBackend {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, RouterError> {
        let params = CreateOrderParams {
            symbol: request.symbol.to_uppercase(),
            side: request.side.as_str().to_string(),
            order_type: request.order_type.as_str().to_string(),
            quantity: request.quantity,
            recv_window: self.recv_window,
            // Market orders execute at whatever the book gives; a price is
            // only meaningful on the wire for other order types.
            price: match request.order_type {
                OrderType::Market => None,
                OrderType::Limit => request.limit_price,
            },
        };

        let response = self
            .gateway
            .create_order(&params)
            .await
            .map_err(|e| RouterError::Rejected(e.to_string()))?;

        let filled_quantity = response.executed_qty;
        let quote_quantity = response.cummulative_quote_qty;
        let filled_price = if !filled_quantity.is_zero() && !quote_quantity.is_zero() {
            Some(quote_quantity / filled_quantity)
        } else {
            request.limit_price
        };

        let raw = serde_json::to_value(&response).unwrap_or(serde_json::Value::Null);
        Ok(OrderResult {
            order_id: response.order_id.to_string(),
            status: OrderStatus::from_exchange(&response.status),
            filled_quantity,
            filled_price,
            raw,
        })
    }
}

/// Submits approved order requests to whichever backend it was built with.
pub struct OrderRouter {
    backend: Box<dyn RouterBackend>,
}

impl OrderRouter {
    /// Chooses the backend from configuration: credentials present means
    /// live, otherwise simulated.
    pub fn from_config(exchange: &ExchangeConfig) -> Self {
        if exchange.is_configured() {
            tracing::info!(network = %exchange.network, "Order router using live backend");
            let gateway = Arc::new(BinanceGateway::new(exchange));
            Self::live(gateway, exchange.recv_window)
        } else {
            tracing::info!("No exchange credentials; order router using simulated backend");
            Self::simulated()
        }
    }

    pub fn simulated() -> Self {
        Self {
            backend: Box::new(SimulatedBackend::new()),
        }
    }

    pub fn live(gateway: Arc<dyn ExchangeGateway>, recv_window: u64) -> Self {
        Self {
            backend: Box::new(LiveBackend::new(gateway, recv_window)),
        }
    }

    /// Wraps an arbitrary backend; useful for tests and custom fills.
    pub fn with_backend(backend: Box<dyn RouterBackend>) -> Self {
        Self { backend }
    }

    /// Submits one request and returns the resulting fill report.
    pub async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, RouterError> {
        tracing::debug!(symbol = %request.symbol, side = %request.side, quantity = %request.quantity, "Submitting order");
        let result = self.backend.submit(request).await?;
        tracing::debug!(order_id = %result.order_id, status = ?result.status, "Order result received");
        Ok(result)
    }
}
