use crate::auth::sign_request;
use crate::error::GatewayError;
use async_trait::async_trait;
use configuration::ExchangeConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The order-creation payload at the exchange boundary: already uppercased
/// and flattened the way the wire wants it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderParams {
    pub symbol: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: Decimal,
    #[serde(rename = "recvWindow")]
    pub recv_window: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// The response from a successful order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: i64,
    pub status: String,
    pub executed_qty: Decimal,
    /// Note the exchange's own spelling of "cumulative".
    pub cummulative_quote_qty: Decimal,
}

/// An error response from the exchange API.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeErrorResponse {
    pub code: i32,
    pub msg: String,
}

/// The abstract interface to the exchange's order endpoint. The live backend
/// talks to this, allowing the underlying implementation (real or mock) to be
/// swapped out.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Places a new order on the exchange. (Authenticated)
    async fn create_order(
        &self,
        params: &CreateOrderParams,
    ) -> Result<CreateOrderResponse, GatewayError>;
}

/// A concrete `ExchangeGateway` for the Binance spot API.
#[derive(Clone)]
pub struct BinanceGateway {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl BinanceGateway {
    pub fn new(config: &ExchangeConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MBX-APIKEY",
            HeaderValue::from_str(&config.api_key).expect("Invalid API Key"),
        );

        Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build reqwest client"),
            base_url: config.rest_url().to_string(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn signed_url(&self, path: &str, query_string: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis();
        let query_string = format!("{query_string}&timestamp={timestamp}");
        let signature = sign_request(&self.api_secret, &query_string);
        format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        )
    }
}

#[async_trait]
impl ExchangeGateway for BinanceGateway {
    async fn create_order(
        &self,
        params: &CreateOrderParams,
    ) -> Result<CreateOrderResponse, GatewayError> {
        let query_string = serde_qs::to_string(params)
            .map_err(|e| GatewayError::Deserialization(e.to_string()))?;
        let url = self.signed_url("/api/v3/order", &query_string);

        let response = self.client.post(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<CreateOrderResponse>(&text)
                .map_err(|e| GatewayError::Deserialization(e.to_string()))
        } else {
            let api_error: ExchangeErrorResponse = serde_json::from_str(&text).map_err(|e| {
                GatewayError::Deserialization(format!(
                    "Failed to deserialize error response: {}. Original text: {}",
                    e, text
                ))
            })?;
            Err(GatewayError::Exchange(api_error.code, api_error.msg))
        }
    }
}
