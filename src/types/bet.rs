//! Tap bet types and lifecycle.
//!
//! A bet is created `Active` and reaches exactly one terminal state:
//! `Won` when the price path touches the target before expiry, `Lost` when
//! the window expires untouched.

use serde::{Deserialize, Serialize};

use super::grid::Direction;

/// Status of a tap bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    /// Waiting for a target touch or expiry
    Active,
    /// Price touched the target within the window
    Won,
    /// Window expired without a touch
    Lost,
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetStatus::Active => write!(f, "active"),
            BetStatus::Won => write!(f, "won"),
            BetStatus::Lost => write!(f, "lost"),
        }
    }
}

/// A single wager that price touches a target level within a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapBet {
    /// Unique bet identifier
    pub id: String,
    /// Asset symbol the bet was opened on
    pub asset: String,
    /// Side of the entry price the target sits on
    pub direction: Direction,
    /// Stake committed in USD
    pub stake: f64,
    /// Price level that must be touched to win
    pub target_price: f64,
    /// Price at placement time
    pub entry_price: f64,
    /// Payout multiplier locked at placement
    pub multiplier: f64,
    /// Leverage used to size the external order
    pub leverage: f64,
    /// Placement timestamp (ms since epoch)
    pub placed_at: i64,
    /// Expiry timestamp = placed_at + window * 1000
    pub expires_at: i64,
    /// Current lifecycle state
    pub status: BetStatus,
    /// Realized PnL once resolved
    pub result_pnl: Option<f64>,
    /// Resolution timestamp
    pub resolved_at: Option<i64>,
}

/// Outcome of resolving a single bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResolution {
    /// The bet in its terminal state
    pub bet: TapBet,
    /// Whether the target was touched in time
    pub won: bool,
    /// Gross payout (stake * multiplier) on a win
    pub payout: Option<f64>,
    /// Net PnL: stake * (multiplier - 1) on a win, -stake on a loss
    pub pnl: f64,
}

/// Running session counters, updated once per resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_bets: u64,
    pub total_won: u64,
    pub total_lost: u64,
    pub total_wagered: f64,
    pub total_payout: f64,
    pub net_pnl: f64,
    pub best_multiplier_hit: f64,
}

// =============================================================================
// Error Type
// =============================================================================

/// Errors surfaced by bet placement and engine state setters.
#[derive(Debug, thiserror::Error)]
pub enum BetError {
    #[error("Insufficient balance: need ${needed:.2}, available ${available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("Execution gateway is not connected")]
    NotConnected,

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Another placement is already in flight")]
    AlreadyPlacing,

    #[error("No price received yet for {0}")]
    NoPrice(String),

    #[error("Invalid stake: ${0:.2}")]
    InvalidStake(f64),

    #[error("Maximum active bets reached ({max})")]
    MaxBetsReached { max: usize },

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Engine is shut down")]
    ShutDown,
}
