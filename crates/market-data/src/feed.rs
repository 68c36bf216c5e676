use crate::error::MarketDataError;
use crate::synthetic::SyntheticWalk;
use chrono::{TimeZone, Utc};
use configuration::{ExchangeConfig, StreamType};
use core_types::Tick;
use futures_util::StreamExt;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

// --- WebSocket Deserialization Structs ---
#[derive(Debug, Deserialize)]
struct WsStreamWrapper {
    #[allow(dead_code)]
    stream: String,
    data: WsTickerEvent,
}

#[derive(Debug, Deserialize)]
struct WsTickerEvent {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "E")]
    event_time_ms: i64,
    #[serde(rename = "v", default)]
    volume: Option<String>,
}

impl WsTickerEvent {
    fn into_tick(self) -> Result<Tick, MarketDataError> {
        let price = Decimal::from_str(&self.close)
            .map_err(|e| MarketDataError::Parse(format!("close price: {e}")))?;
        let timestamp = Utc
            .timestamp_millis_opt(self.event_time_ms)
            .single()
            .ok_or_else(|| {
                MarketDataError::Parse(format!("event time: {}", self.event_time_ms))
            })?;
        let volume = match self.volume {
            Some(v) => Some(
                Decimal::from_str(&v)
                    .map_err(|e| MarketDataError::Parse(format!("volume: {e}")))?,
            ),
            None => None,
        };
        Ok(Tick {
            symbol: self.symbol,
            price,
            timestamp,
            volume,
        })
    }
}

enum FeedMode {
    Live {
        ws_url: String,
        stream_type: StreamType,
    },
    Synthetic,
}

/// Handle to a running feed's background task. Stopping aborts the producer;
/// the consumer drains whatever is already buffered and then sees the end of
/// the sequence.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    abort: AbortHandle,
}

impl FeedHandle {
    pub fn stop(&self) {
        self.abort.abort();
    }
}

/// Produces the lazy tick sequence for a requested symbol set.
///
/// The variant is fixed at construction: exchange credentials present means
/// the live multiplexed ticker stream, otherwise the synthetic walk. The
/// consumer cannot tell which one is feeding it.
pub struct MarketFeed {
    mode: FeedMode,
}

impl MarketFeed {
    pub fn from_config(exchange: &ExchangeConfig) -> Self {
        if exchange.is_configured() {
            tracing::info!(network = %exchange.network, "Market feed using live stream");
            Self {
                mode: FeedMode::Live {
                    ws_url: exchange.ws_url().to_string(),
                    stream_type: exchange.stream_type,
                },
            }
        } else {
            tracing::info!("No exchange credentials; market feed using synthetic ticks");
            Self::synthetic()
        }
    }

    pub fn synthetic() -> Self {
        Self {
            mode: FeedMode::Synthetic,
        }
    }

    /// Spawns the producer task and returns the consumer end of the channel
    /// together with a stop handle.
    pub fn start_stream(
        &self,
        symbols: &[String],
    ) -> Result<(mpsc::Receiver<Tick>, FeedHandle), MarketDataError> {
        let (tx, rx) = mpsc::channel(1024);

        let task = match &self.mode {
            FeedMode::Live {
                ws_url,
                stream_type,
            } => {
                let streams = symbols
                    .iter()
                    .map(|s| format!("{}@{}", s.to_lowercase(), stream_type.stream_suffix()))
                    .collect::<Vec<_>>()
                    .join("/");
                let mut url = Url::parse(ws_url)
                    .map_err(|e| MarketDataError::Connection(e.to_string()))?;
                url.set_path("/stream");
                url.set_query(Some(&format!("streams={streams}")));
                tokio::spawn(run_live_stream(url, tx))
            }
            FeedMode::Synthetic => {
                let symbols = symbols.to_vec();
                tokio::spawn(run_synthetic_stream(symbols, tx))
            }
        };

        Ok((
            rx,
            FeedHandle {
                abort: task.abort_handle(),
            },
        ))
    }
}

/// Connects to the multiplexed stream and forwards one tick per message.
/// Parse failures skip the message; a dropped connection reconnects after a
/// short pause. The task exits only when the receiver goes away.
async fn run_live_stream(url: Url, tx: mpsc::Sender<Tick>) {
    loop {
        tracing::info!(%url, "Connecting to market stream");
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                tracing::info!("Market stream connection established");
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            let wrapper = match serde_json::from_str::<WsStreamWrapper>(&text) {
                                Ok(wrapper) => wrapper,
                                Err(e) => {
                                    tracing::debug!(error = %e, "Skipping unparsable stream message");
                                    continue;
                                }
                            };
                            match wrapper.data.into_tick() {
                                Ok(tick) => {
                                    if tx.send(tick).await.is_err() {
                                        tracing::info!("Tick receiver dropped; closing market stream");
                                        return;
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "Skipping malformed ticker event");
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "Market stream read error");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Market stream connection error");
            }
        }
        if tx.is_closed() {
            return;
        }
        tracing::warn!("Market stream disconnected. Reconnecting in 5 seconds...");
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

/// Emits one synthetic tick per second for a randomly chosen symbol.
async fn run_synthetic_stream(symbols: Vec<String>, tx: mpsc::Sender<Tick>) {
    let mut walk = SyntheticWalk::new(&symbols);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // the first tick completes immediately
    loop {
        interval.tick().await;
        let symbol = walk.pick();
        let price = walk.step(&symbol);
        let tick = Tick {
            symbol,
            price,
            timestamp: Utc::now(),
            volume: Some(Decimal::ZERO),
        };
        if tx.send(tick).await.is_err() {
            return;
        }
    }
}
