//! Tapline - Real-time tap trading engine on live crypto price feeds
//!
//! A tap bet wagers that price touches a target level within a short time
//! window. The engine streams prices over WebSocket, offers a two-sided
//! price/time grid of payout multipliers, places one external market order
//! per bet, and resolves each bet exactly once from the full observed price
//! path.

pub mod config;
pub mod feedback;
pub mod gateway;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::{Config, EngineConfig, FeedConfig, GridParams};
pub use services::{BetLedger, BetMonitor, BettingEngine, FeedStore};
pub use types::*;
