//! HTTP execution gateway client.
//!
//! Thin client for an execution service that signs and forwards orders to
//! the venue. Connectivity is inferred from the most recent call's outcome.

use super::{ExecutionGateway, GatewayError, MarketOrderRequest, OrderAck};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Execution service response for an order submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    status: String,
    order_id: Option<String>,
    error: Option<String>,
}

/// Execution service response for a balance query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    withdrawable: f64,
}

/// Gateway backed by an HTTP execution service.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    connected: AtomicBool,
}

impl HttpGateway {
    /// Create a new client for the given execution service base URL.
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .user_agent("Tapline/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            connected: AtomicBool::new(false),
        }
    }

    fn record_outcome(&self, ok: bool) {
        self.connected.store(ok, Ordering::Relaxed);
    }
}

#[async_trait]
impl ExecutionGateway for HttpGateway {
    async fn submit_market_order(
        &self,
        order: &MarketOrderRequest,
    ) -> Result<OrderAck, GatewayError> {
        let url = format!("{}/order", self.base_url);
        debug!(
            "Submitting market order: asset={} buy={} size={} price={}",
            order.asset_index, order.is_buy, order.size, order.price
        );

        let response = match self.client.post(&url).json(order).send().await {
            Ok(r) => r,
            Err(e) => {
                self.record_outcome(false);
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            self.record_outcome(false);
            warn!("Execution service returned {}: {}", status, &text[..text.len().min(200)]);
            return Err(GatewayError::Rejected(format!(
                "execution service returned {}",
                status
            )));
        }

        let body: OrderResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                self.record_outcome(false);
                return Err(GatewayError::Malformed(e.to_string()));
            }
        };

        self.record_outcome(true);
        if body.status == "ok" {
            Ok(OrderAck { order_id: body.order_id })
        } else {
            Err(GatewayError::Rejected(
                body.error.unwrap_or_else(|| "unspecified rejection".to_string()),
            ))
        }
    }

    async fn withdrawable_balance(&self) -> Result<f64, GatewayError> {
        let url = format!("{}/balance", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                self.record_outcome(false);
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            self.record_outcome(false);
            return Err(GatewayError::Rejected(format!(
                "balance query returned {}",
                response.status()
            )));
        }

        match response.json::<BalanceResponse>().await {
            Ok(body) => {
                self.record_outcome(true);
                Ok(body.withdrawable)
            }
            Err(e) => {
                self.record_outcome(false);
                Err(GatewayError::Malformed(e.to_string()))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
