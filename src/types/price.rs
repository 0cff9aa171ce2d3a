//! Price feed types.

use serde::{Deserialize, Serialize};

/// A single observed price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Receipt timestamp (ms since epoch)
    pub time: i64,
    /// Observed price
    pub price: f64,
}

/// Events emitted by the price feed store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedEvent {
    /// A new price tick was applied for a symbol.
    #[serde(rename_all = "camelCase")]
    Tick { symbol: String, price: f64, time: i64 },
    /// The streaming connection for a symbol came up.
    #[serde(rename_all = "camelCase")]
    Connected { symbol: String },
    /// The streaming connection for a symbol went down; reconnect is scheduled.
    #[serde(rename_all = "camelCase")]
    Disconnected { symbol: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_point_serialization() {
        let point = PricePoint { time: 1700000000000, price: 43500.5 };
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"time\":1700000000000"));
        assert!(json.contains("\"price\":43500.5"));
    }

    #[test]
    fn test_feed_event_tick_tagged() {
        let event = FeedEvent::Tick {
            symbol: "BTC".to_string(),
            price: 60000.0,
            time: 1700000000000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"tick\""));
        assert!(json.contains("\"symbol\":\"BTC\""));
    }

    #[test]
    fn test_feed_event_disconnected_carries_reason() {
        let event = FeedEvent::Disconnected {
            symbol: "ETH".to_string(),
            reason: "connection reset".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("connection reset"));
    }
}
