//! Order execution gateway.
//!
//! The engine consumes execution and account balance through this seam; the
//! wire protocol belongs to the gateway implementation, not to the engine.

pub mod http;
pub mod paper;

pub use http::HttpGateway;
pub use paper::PaperGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A market order sized and directed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOrderRequest {
    /// Gateway-side asset index
    pub asset_index: u32,
    /// Buy (long) or sell (short)
    pub is_buy: bool,
    /// Order size in base units
    pub size: f64,
    /// Reference price at submission time
    pub price: f64,
}

/// Acknowledgement that an order was accepted for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    /// Gateway-assigned order identifier, when one is provided
    pub order_id: Option<String>,
}

/// Gateway failures. Rejections carry the gateway's human-readable reason.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Malformed gateway response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// External order-execution and account-balance source.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Submit a market order. Success means accepted for execution, not
    /// necessarily filled.
    async fn submit_market_order(&self, order: &MarketOrderRequest)
        -> Result<OrderAck, GatewayError>;

    /// Current withdrawable account balance in USD.
    async fn withdrawable_balance(&self) -> Result<f64, GatewayError>;

    /// Whether the gateway is currently reachable.
    fn is_connected(&self) -> bool;
}
