//! Live price feed store.
//!
//! Keeps the current price, a bounded tick history, and connection status
//! per symbol, and fans out [`FeedEvent`]s on a broadcast channel. The
//! WebSocket client (see `sources::hyperliquid`) writes into this store;
//! the engine and the odds grid read from it.
//!
//! Every (re)connection attempt obtains a fresh generation number via
//! [`FeedStore::begin_connection`]. Writes carry their generation and are
//! dropped once a newer generation exists, so a torn-down connection can
//! never mutate feed state after the fact.

use crate::config::FeedConfig;
use crate::types::{FeedEvent, PricePoint};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Minimum retained ticks before a volatility estimate is produced.
const MIN_VOLATILITY_SAMPLES: usize = 10;

/// Per-symbol feed state.
#[derive(Debug, Default)]
struct SymbolFeed {
    current: Option<f64>,
    history: VecDeque<PricePoint>,
    connected: bool,
    last_error: Option<String>,
    /// Generation of the connection allowed to write; stale writers are dropped.
    generation: u64,
}

/// Shared store of live per-symbol price state.
pub struct FeedStore {
    feeds: DashMap<String, SymbolFeed>,
    history_limit: usize,
    tx: broadcast::Sender<FeedEvent>,
}

impl FeedStore {
    /// Create a new feed store.
    pub fn new(config: &FeedConfig) -> (Arc<Self>, broadcast::Receiver<FeedEvent>) {
        let (tx, rx) = broadcast::channel(1024);
        let store = Arc::new(Self {
            feeds: DashMap::new(),
            history_limit: config.history_limit,
            tx,
        });
        (store, rx)
    }

    /// Subscribe to feed events.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Register a new connection attempt for a symbol and return its
    /// generation. Any previous connection's writes become stale.
    pub fn begin_connection(&self, symbol: &str) -> u64 {
        let mut entry = self.feeds.entry(normalize(symbol)).or_default();
        let feed = entry.value_mut();
        feed.generation += 1;
        feed.connected = false;
        feed.generation
    }

    /// Mark a symbol's connection as established.
    pub fn mark_connected(&self, symbol: &str, generation: u64) {
        let key = normalize(symbol);
        let mut became_connected = false;
        if let Some(mut entry) = self.feeds.get_mut(&key) {
            if entry.generation == generation {
                entry.connected = true;
                entry.last_error = None;
                became_connected = true;
            }
        }
        if became_connected {
            let _ = self.tx.send(FeedEvent::Connected { symbol: key });
        }
    }

    /// Mark a symbol's connection as down, recording the reason.
    pub fn mark_disconnected(&self, symbol: &str, generation: u64, reason: &str) {
        let key = normalize(symbol);
        let mut became_disconnected = false;
        if let Some(mut entry) = self.feeds.get_mut(&key) {
            if entry.generation == generation {
                entry.connected = false;
                entry.last_error = Some(reason.to_string());
                became_disconnected = true;
            }
        }
        if became_disconnected {
            let _ = self.tx.send(FeedEvent::Disconnected {
                symbol: key,
                reason: reason.to_string(),
            });
        }
    }

    /// Retire a symbol's feed: invalidate the active generation so any
    /// in-flight writes from its connection are dropped.
    pub fn retire(&self, symbol: &str) {
        if let Some(mut entry) = self.feeds.get_mut(&normalize(symbol)) {
            entry.generation += 1;
            entry.connected = false;
        }
    }

    // =========================================================================
    // Tick application
    // =========================================================================

    /// Apply a price tick from connection `generation`. Returns false if the
    /// tick was dropped as stale or invalid.
    pub fn apply_tick(&self, symbol: &str, generation: u64, price: f64, time: i64) -> bool {
        if !price.is_finite() || price <= 0.0 {
            debug!("Dropping invalid price {} for {}", price, symbol);
            return false;
        }

        let key = normalize(symbol);
        let applied = {
            let mut entry = match self.feeds.get_mut(&key) {
                Some(e) => e,
                None => return false,
            };
            if entry.generation != generation {
                debug!("Dropping stale tick for {} (gen {})", key, generation);
                return false;
            }

            entry.current = Some(price);
            entry.history.push_back(PricePoint { time, price });
            while entry.history.len() > self.history_limit {
                entry.history.pop_front();
            }
            true
        };

        if applied {
            let _ = self.tx.send(FeedEvent::Tick { symbol: key, price, time });
        }
        applied
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Latest price for a symbol, if any tick has arrived.
    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.feeds.get(&normalize(symbol)).and_then(|f| f.current)
    }

    /// Retained price history, oldest first.
    pub fn history(&self, symbol: &str) -> Vec<PricePoint> {
        self.feeds
            .get(&normalize(symbol))
            .map(|f| f.history.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the symbol's streaming connection is currently up.
    pub fn is_connected(&self, symbol: &str) -> bool {
        self.feeds
            .get(&normalize(symbol))
            .map(|f| f.connected)
            .unwrap_or(false)
    }

    /// Last transport error recorded for the symbol.
    pub fn last_error(&self, symbol: &str) -> Option<String> {
        self.feeds
            .get(&normalize(symbol))
            .and_then(|f| f.last_error.clone())
    }

    /// Annualized volatility estimated from log returns over the retained
    /// history. None until enough samples have accumulated.
    pub fn realized_volatility(&self, symbol: &str) -> Option<f64> {
        let entry = self.feeds.get(&normalize(symbol))?;
        let ticks = &entry.history;
        if ticks.len() < MIN_VOLATILITY_SAMPLES {
            return None;
        }

        let mut log_returns = Vec::with_capacity(ticks.len() - 1);
        for i in 1..ticks.len() {
            let prev = ticks[i - 1].price;
            let curr = ticks[i].price;
            if prev > 0.0 && curr > 0.0 {
                log_returns.push((curr / prev).ln());
            }
        }
        if log_returns.is_empty() {
            return None;
        }

        let n = log_returns.len() as f64;
        let mean = log_returns.iter().sum::<f64>() / n;
        let variance = log_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        // Annualize from the average observed tick interval.
        let first_ts = ticks.front()?.time;
        let last_ts = ticks.back()?.time;
        let total_span_ms = (last_ts - first_ts).max(1) as f64;
        let avg_interval_ms = total_span_ms / (ticks.len() - 1) as f64;
        let ms_per_year = 365.25 * 24.0 * 3600.0 * 1000.0;
        let ticks_per_year = ms_per_year / avg_interval_ms;
        let annualized = std_dev * ticks_per_year.sqrt();

        Some(annualized.clamp(0.01, 10.0))
    }
}

fn normalize(symbol: &str) -> String {
    symbol.to_uppercase()
}
