//! Hyperliquid market-data WebSocket client.
//!
//! Streams trades for one symbol into the [`FeedStore`]. The connection is
//! supervised: on any transport error or close the client marks the feed
//! disconnected, waits a fixed delay, and reconnects indefinitely. Each
//! attempt runs under a fresh feed-store generation so a superseded
//! connection can never write state after teardown.

use crate::config::FeedConfig;
use crate::services::FeedStore;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Subscription request sent on connect.
#[derive(Debug, Serialize)]
struct SubscribeMessage {
    method: String,
    subscription: Subscription,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    #[serde(rename = "type")]
    sub_type: String,
    coin: String,
}

/// Incoming stream frame.
#[derive(Debug, Deserialize)]
struct StreamMessage {
    channel: String,
    #[serde(default)]
    data: Vec<TradeEvent>,
}

/// A single trade from the feed.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TradeEvent {
    coin: String,
    px: String,
    sz: String,
    time: i64,
}

/// Streaming market-data client for one symbol.
pub struct HyperliquidWs {
    store: Arc<FeedStore>,
    url: String,
    reconnect_delay: Duration,
}

impl HyperliquidWs {
    /// Create a new client writing into the given feed store.
    pub fn new(store: Arc<FeedStore>, config: &FeedConfig, url: String) -> Self {
        Self {
            store,
            url,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }

    /// Stream trades for `symbol` until the shutdown signal flips.
    ///
    /// Reconnects forever on failure; a stalled venue is a liveness gap,
    /// never a fatal error.
    pub async fn run(&self, symbol: &str, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let generation = self.store.begin_connection(symbol);
            match self.run_connection(symbol, generation, &mut shutdown).await {
                Ok(()) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    warn!("Market stream for {} closed, reconnecting...", symbol);
                    self.store
                        .mark_disconnected(symbol, generation, "stream closed");
                }
                Err(e) => {
                    error!("Market stream error for {}: {}, reconnecting...", symbol, e);
                    self.store
                        .mark_disconnected(symbol, generation, &e.to_string());
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        debug!("Market stream task for {} stopped", symbol);
    }

    async fn run_connection(
        &self,
        symbol: &str,
        generation: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!("Connecting to market stream for {}", symbol);
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe = SubscribeMessage {
            method: "subscribe".to_string(),
            subscription: Subscription {
                sub_type: "trades".to_string(),
                coin: symbol.to_uppercase(),
            },
        };
        write
            .send(Message::Text(serde_json::to_string(&subscribe)?))
            .await?;

        self.store.mark_connected(symbol, generation);
        info!("Market stream connected for {}", symbol);

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(symbol, generation, &text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Market stream closed for {}", symbol);
                            break;
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => break,
                        _ => {}
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Parse one frame and apply its trades. Malformed frames are dropped
    /// here; they never stall the stream.
    fn handle_message(&self, symbol: &str, generation: u64, text: &str) {
        let msg: StreamMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                debug!("Dropping malformed frame for {}: {}", symbol, e);
                return;
            }
        };

        if msg.channel != "trades" {
            return;
        }

        // Receipt time, not venue time: the excursion tracker and history
        // are ordered by when this process observed the trade.
        let now = chrono::Utc::now().timestamp_millis();
        for trade in msg.data {
            let price: f64 = match trade.px.parse() {
                Ok(p) => p,
                Err(_) => {
                    debug!("Dropping unparseable price {:?} for {}", trade.px, symbol);
                    continue;
                }
            };
            self.store.apply_tick(symbol, generation, price, now);
        }
    }
}
