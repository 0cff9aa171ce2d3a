use std::env;

/// Price feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Maximum retained price points per symbol.
    pub history_limit: usize,
    /// Delay between reconnect attempts in milliseconds.
    pub reconnect_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            reconnect_delay_ms: 3_000,
        }
    }
}

/// Odds grid shape and multiplier bounds.
#[derive(Debug, Clone)]
pub struct GridParams {
    /// Price levels offered on each side of the current price.
    pub rows_per_side: usize,
    /// Time windows offered, in seconds (one grid column each).
    pub time_windows_secs: Vec<u64>,
    /// Floor for any offered multiplier.
    pub min_multiplier: f64,
    /// Cap for any offered multiplier.
    pub max_multiplier: f64,
    /// Flat percentage retained by the house (0.05 = 5%).
    pub house_edge: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            rows_per_side: 15,
            time_windows_secs: vec![5, 10, 15, 20, 25, 30],
            min_multiplier: 1.01,
            max_multiplier: 25.0,
            house_edge: 0.05,
        }
    }
}

/// Engine-level cadences and placement limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Resolution evaluation cadence in milliseconds.
    pub resolution_interval_ms: u64,
    /// Cadence for polling the gateway's withdrawable balance.
    pub balance_poll_ms: u64,
    /// Maximum simultaneously active bets.
    pub max_active_bets: usize,
    /// Minimum stake per bet in USD.
    pub min_stake: f64,
    /// Leverage applied when sizing the external order.
    pub leverage: f64,
    pub feed: FeedConfig,
    pub grid: GridParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution_interval_ms: 100,
            balance_poll_ms: 5_000,
            max_active_bets: 10,
            min_stake: 0.10,
            leverage: 1.0,
            feed: FeedConfig::default(),
            grid: GridParams::default(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Market-data WebSocket endpoint.
    pub ws_url: String,
    /// Execution service base URL; falls back to the paper gateway if unset.
    pub execution_url: Option<String>,
    /// Asset selected at startup.
    pub default_asset: String,
    /// Stake used for placements until changed.
    pub default_bet_amount: f64,
    /// Starting balance for the paper gateway.
    pub paper_balance: f64,
    /// Engine tuning.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let mut engine = EngineConfig::default();

        if let Some(leverage) = parse_env("TAPLINE_LEVERAGE") {
            engine.leverage = leverage;
        }
        if let Some(interval) = parse_env("TAPLINE_RESOLUTION_INTERVAL_MS") {
            engine.resolution_interval_ms = interval;
        }
        if let Some(delay) = parse_env("TAPLINE_RECONNECT_DELAY_MS") {
            engine.feed.reconnect_delay_ms = delay;
        }
        if let Some(limit) = parse_env("TAPLINE_HISTORY_LIMIT") {
            engine.feed.history_limit = limit;
        }
        if let Some(max) = parse_env("TAPLINE_MAX_ACTIVE_BETS") {
            engine.max_active_bets = max;
        }

        Self {
            ws_url: env::var("TAPLINE_WS_URL")
                .unwrap_or_else(|_| "wss://api.hyperliquid.xyz/ws".to_string()),
            execution_url: env::var("TAPLINE_EXECUTION_URL").ok(),
            default_asset: env::var("TAPLINE_ASSET").unwrap_or_else(|_| "BTC".to_string()),
            default_bet_amount: parse_env("TAPLINE_BET_AMOUNT").unwrap_or(10.0),
            paper_balance: parse_env("TAPLINE_PAPER_BALANCE").unwrap_or(1_000.0),
            engine,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_defaults() {
        let feed = FeedConfig::default();
        assert_eq!(feed.history_limit, 100);
        assert_eq!(feed.reconnect_delay_ms, 3_000);
    }

    #[test]
    fn test_grid_defaults() {
        let grid = GridParams::default();
        assert_eq!(grid.rows_per_side, 15);
        assert_eq!(grid.time_windows_secs, vec![5, 10, 15, 20, 25, 30]);
        assert!(grid.min_multiplier > 1.0);
        assert!(grid.max_multiplier > grid.min_multiplier);
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.resolution_interval_ms, 100);
        assert_eq!(engine.max_active_bets, 10);
        assert!(engine.leverage >= 1.0);
    }
}
