//! Engine events and consolidated view state.

use serde::Serialize;

use super::bet::{BetResolution, SessionStats, TapBet};
use super::price::PricePoint;

/// Events broadcast by the engine to subscribers (UI, sound, logging).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A bet was accepted by the gateway and entered the active set.
    #[serde(rename_all = "camelCase")]
    BetPlaced { bet: TapBet, timestamp: i64 },
    /// A bet reached its terminal state.
    #[serde(rename_all = "camelCase")]
    BetResolved { resolution: BetResolution, timestamp: i64 },
    /// The market-data connection for a symbol came up.
    #[serde(rename_all = "camelCase")]
    FeedConnected { symbol: String },
    /// The market-data connection for a symbol dropped; reconnect pending.
    #[serde(rename_all = "camelCase")]
    FeedDisconnected { symbol: String, reason: String },
}

/// Consolidated engine state snapshot for consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineView {
    /// Currently selected asset symbol
    pub asset: String,
    /// Latest price for the selected asset, if any tick arrived yet
    pub current_price: Option<f64>,
    /// Recent price history for the selected asset
    pub price_history: Vec<PricePoint>,
    /// Stake used for the next placement
    pub bet_amount: f64,
    /// Bets awaiting resolution (all assets)
    pub active_bets: Vec<TapBet>,
    /// Resolved bets, oldest first
    pub completed_bets: Vec<TapBet>,
    /// External balance minus active stakes
    pub available_balance: f64,
    /// Accumulated PnL across this session's resolutions
    pub session_pnl: f64,
    /// Whether the selected asset's feed is currently connected
    pub is_connected: bool,
    /// Session counters
    pub stats: SessionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bet::BetStatus;
    use crate::types::grid::Direction;

    fn sample_bet() -> TapBet {
        TapBet {
            id: "bet-1".to_string(),
            asset: "BTC".to_string(),
            direction: Direction::Short,
            stake: 25.0,
            target_price: 59900.0,
            entry_price: 60000.0,
            multiplier: 3.5,
            leverage: 2.0,
            placed_at: 1700000000000,
            expires_at: 1700000015000,
            status: BetStatus::Active,
            result_pnl: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_bet_placed_event_tagged() {
        let event = EngineEvent::BetPlaced {
            bet: sample_bet(),
            timestamp: 1700000000000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"betPlaced\""));
        assert!(json.contains("\"asset\":\"BTC\""));
    }

    #[test]
    fn test_engine_view_serializes() {
        let view = EngineView {
            asset: "BTC".to_string(),
            current_price: Some(60000.0),
            price_history: vec![PricePoint { time: 1, price: 60000.0 }],
            bet_amount: 10.0,
            active_bets: vec![sample_bet()],
            completed_bets: Vec::new(),
            available_balance: 975.0,
            session_pnl: 0.0,
            is_connected: true,
            stats: SessionStats::default(),
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"availableBalance\":975.0"));
        assert!(json.contains("\"isConnected\":true"));
    }
}
