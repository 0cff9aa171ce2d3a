//! Betting engine.
//!
//! Composition root for tap trading: owns the feed store, ledger, and
//! monitor, talks to the execution gateway, and runs the background loops.
//! Consumers hold an `Arc<BettingEngine>` and interact through `place_bet`,
//! `set_bet_amount`, `set_asset`, `grid`, `view`, and `subscribe`.
//!
//! The loop bodies (`observe_price`, `resolve_due`) are public so a
//! simulation or test can drive ticks and evaluation with injected time
//! instead of waiting on the wall clock.

use crate::config::Config;
use crate::feedback::FeedbackSink;
use crate::gateway::{ExecutionGateway, MarketOrderRequest};
use crate::services::grid::generate_grid;
use crate::services::{BetLedger, BetMonitor, FeedStore};
use crate::sources::HyperliquidWs;
use crate::types::{
    lookup_asset, BetError, BetResolution, BetStatus, Direction, EngineEvent, EngineView, GridBox,
    GridView, TapBet,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// RAII single-flight guard for placement. Acquire fails while another
/// placement holds the flag; drop releases it on every exit path.
struct PlacingGuard<'a>(&'a AtomicBool);

impl<'a> PlacingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| Self(flag))
    }
}

impl Drop for PlacingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Tap trading engine.
pub struct BettingEngine {
    config: Config,
    feed: Arc<FeedStore>,
    ledger: Arc<BetLedger>,
    monitor: Arc<BetMonitor>,
    gateway: Arc<dyn ExecutionGateway>,
    feedback: Arc<dyn FeedbackSink>,
    events: broadcast::Sender<EngineEvent>,
    /// Single-flight flag: set while an order submission is in flight.
    placing: AtomicBool,
    asset: Mutex<String>,
    bet_amount: Mutex<f64>,
    shutdown: watch::Sender<bool>,
    feed_tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl BettingEngine {
    /// Construct an engine. No background work starts until [`start`].
    ///
    /// [`start`]: BettingEngine::start
    pub fn new(
        config: Config,
        gateway: Arc<dyn ExecutionGateway>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Arc<Self> {
        let (feed, _rx) = FeedStore::new(&config.engine.feed);
        let (events, _events_rx) = broadcast::channel(256);
        let (shutdown, _) = watch::channel(false);

        let asset = lookup_asset(&config.default_asset)
            .map(|a| a.symbol.to_string())
            .unwrap_or_else(|| "BTC".to_string());

        Arc::new(Self {
            feed,
            ledger: Arc::new(BetLedger::new(0.0)),
            monitor: Arc::new(BetMonitor::new()),
            gateway,
            feedback,
            events,
            placing: AtomicBool::new(false),
            asset: Mutex::new(asset),
            bet_amount: Mutex::new(config.default_bet_amount),
            shutdown,
            feed_tasks: Mutex::new(HashMap::new()),
            config,
        })
    }

    /// Start the market-data feed for the selected asset and the
    /// resolution and balance loops.
    pub fn start(self: &Arc<Self>) {
        let asset = self.asset();
        self.ensure_feed(&asset);
        self.spawn_resolution_loop();
        self.spawn_balance_loop();
        info!("Betting engine started on {}", asset);
    }

    /// Subscribe to bet lifecycle and connectivity events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Shared feed store (read access for consumers; sources write here).
    pub fn feed(&self) -> Arc<FeedStore> {
        self.feed.clone()
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Place a tap bet on a grid cell.
    ///
    /// Preconditions are checked before any side effect; each failure maps
    /// to a distinct [`BetError`] with no state mutated. Exactly one
    /// external order is submitted per successful placement, and the bet
    /// enters the active set only after the gateway acknowledges it.
    pub async fn place_bet(&self, cell: &GridBox) -> Result<TapBet, BetError> {
        if self.is_shut_down() {
            return Err(BetError::ShutDown);
        }

        // Concurrent taps are rejected, not queued.
        let _guard = PlacingGuard::acquire(&self.placing).ok_or(BetError::AlreadyPlacing)?;

        let asset = self.asset();
        let spec = lookup_asset(&asset).ok_or_else(|| BetError::UnknownAsset(asset.clone()))?;

        let stake = self.bet_amount();
        if stake < self.config.engine.min_stake {
            return Err(BetError::InvalidStake(stake));
        }

        if !self.gateway.is_connected() {
            return Err(BetError::NotConnected);
        }

        if self.ledger.active_count() >= self.config.engine.max_active_bets {
            return Err(BetError::MaxBetsReached {
                max: self.config.engine.max_active_bets,
            });
        }

        let available = self.ledger.available_balance();
        if available < stake {
            return Err(BetError::InsufficientBalance {
                needed: stake,
                available,
            });
        }

        let entry_price = self
            .feed
            .current_price(&asset)
            .ok_or_else(|| BetError::NoPrice(asset.clone()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let bet = TapBet {
            id: Uuid::new_v4().to_string(),
            asset: asset.clone(),
            direction: cell.direction,
            stake,
            target_price: cell.price,
            entry_price,
            multiplier: cell.multiplier,
            leverage: self.config.engine.leverage,
            placed_at: now,
            expires_at: now + cell.time_window_secs as i64 * 1000,
            status: BetStatus::Active,
            result_pnl: None,
            resolved_at: None,
        };

        let order = MarketOrderRequest {
            asset_index: spec.asset_index,
            is_buy: cell.direction == Direction::Long,
            size: stake * self.config.engine.leverage / entry_price,
            price: entry_price,
        };

        match self.gateway.submit_market_order(&order).await {
            Ok(_ack) => {
                if self.is_shut_down() {
                    // Torn down mid-flight: the order stands externally, but
                    // there is no engine state left to attach it to.
                    warn!("Engine shut down during submission; ignoring ack for {}", bet.id);
                    return Err(BetError::ShutDown);
                }
                self.ledger.insert(bet.clone());
                self.monitor.track(&bet);
                self.feedback.bet_placed(&bet);
                let _ = self.events.send(EngineEvent::BetPlaced {
                    bet: bet.clone(),
                    timestamp: now,
                });
                Ok(bet)
            }
            Err(e) => {
                warn!("Order submission failed: {}", e);
                Err(BetError::OrderRejected(e.to_string()))
            }
        }
    }

    // =========================================================================
    // State setters
    // =========================================================================

    /// Set the stake used for subsequent placements.
    pub fn set_bet_amount(&self, amount: f64) {
        *self.bet_amount.lock().unwrap() = amount;
    }

    /// Switch the selected asset.
    ///
    /// Bets already active on the previous asset keep resolving against its
    /// feed; that feed is only retired once its last bet drains.
    pub fn set_asset(self: &Arc<Self>, symbol: &str) -> Result<(), BetError> {
        let spec =
            lookup_asset(symbol).ok_or_else(|| BetError::UnknownAsset(symbol.to_string()))?;

        let previous = {
            let mut asset = self.asset.lock().unwrap();
            std::mem::replace(&mut *asset, spec.symbol.to_string())
        };

        if previous != spec.symbol {
            self.ensure_feed(spec.symbol);
            if !self.ledger.has_active_on(&previous) {
                self.retire_feed(&previous);
            }
            info!("Asset switched from {} to {}", previous, spec.symbol);
        }
        Ok(())
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Currently selected asset symbol.
    pub fn asset(&self) -> String {
        self.asset.lock().unwrap().clone()
    }

    /// Stake used for the next placement.
    pub fn bet_amount(&self) -> f64 {
        *self.bet_amount.lock().unwrap()
    }

    /// Consolidated state snapshot.
    pub fn view(&self) -> EngineView {
        let asset = self.asset();
        EngineView {
            current_price: self.feed.current_price(&asset),
            price_history: self.feed.history(&asset),
            bet_amount: self.bet_amount(),
            active_bets: self.ledger.active_bets(),
            completed_bets: self.ledger.completed_bets(),
            available_balance: self.ledger.available_balance(),
            session_pnl: self.ledger.session_pnl(),
            is_connected: self.feed.is_connected(&asset),
            stats: self.ledger.stats(),
            asset,
        }
    }

    /// Fresh odds grid for the selected asset, or None before the first
    /// tick. Always regenerated wholesale from the latest price.
    pub fn grid(&self) -> Option<GridView> {
        let asset = self.asset();
        let spec = lookup_asset(&asset)?;
        let current_price = self.feed.current_price(&asset)?;
        let volatility = self
            .feed
            .realized_volatility(&asset)
            .unwrap_or(spec.default_volatility);
        Some(generate_grid(
            current_price,
            spec,
            volatility,
            &self.config.engine.grid,
            chrono::Utc::now().timestamp_millis(),
        ))
    }

    // =========================================================================
    // Resolution loop body
    // =========================================================================

    /// Fold a price observation into the excursions of active bets on the
    /// symbol. Called by the resolution loop on every feed tick.
    pub fn observe_price(&self, symbol: &str, price: f64) {
        self.monitor.observe_tick(&self.ledger, symbol, price);
    }

    /// Run one evaluation pass at the given time. Called by the resolution
    /// loop on its cadence; callable directly with injected time.
    pub fn resolve_due(&self, now: i64) -> Vec<BetResolution> {
        let resolutions = self.monitor.evaluate(&self.ledger, now);
        if resolutions.is_empty() {
            return resolutions;
        }

        let selected = self.asset();
        for resolution in &resolutions {
            if resolution.won {
                self.feedback.bet_won(resolution);
            } else {
                self.feedback.bet_lost(resolution);
            }
            let _ = self.events.send(EngineEvent::BetResolved {
                resolution: resolution.clone(),
                timestamp: now,
            });

            // A background feed is only kept alive by its bets.
            let bet_asset = &resolution.bet.asset;
            if !bet_asset.eq_ignore_ascii_case(&selected) && !self.ledger.has_active_on(bet_asset) {
                debug!("Retiring drained background feed for {}", bet_asset);
                self.retire_feed(bet_asset);
            }
        }
        resolutions
    }

    /// Poll the gateway balance into the ledger once.
    pub async fn refresh_balance(&self) {
        match self.gateway.withdrawable_balance().await {
            Ok(balance) => self.ledger.set_external_balance(balance),
            Err(e) => debug!("Balance poll failed: {}", e),
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop all background loops and feeds. In-flight order submissions
    /// complete but their results are discarded.
    pub fn shutdown(&self) {
        info!("Betting engine shutting down");
        let _ = self.shutdown.send(true);
        let mut tasks = self.feed_tasks.lock().unwrap();
        for (symbol, handle) in tasks.drain() {
            handle.abort();
            self.feed.retire(&symbol);
        }
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Spawn the feed task for a symbol if one is not already running.
    fn ensure_feed(self: &Arc<Self>, symbol: &str) {
        let key = symbol.to_uppercase();
        let mut tasks = self.feed_tasks.lock().unwrap();
        if tasks.contains_key(&key) {
            return;
        }

        let client = HyperliquidWs::new(
            self.feed.clone(),
            &self.config.engine.feed,
            self.config.ws_url.clone(),
        );
        let shutdown = self.shutdown.subscribe();
        let task_symbol = key.clone();
        let handle = tokio::spawn(async move {
            client.run(&task_symbol, shutdown).await;
        });
        tasks.insert(key, handle);
    }

    fn retire_feed(&self, symbol: &str) {
        let key = symbol.to_uppercase();
        if let Some(handle) = self.feed_tasks.lock().unwrap().remove(&key) {
            handle.abort();
        }
        self.feed.retire(&key);
    }

    fn spawn_resolution_loop(self: &Arc<Self>) {
        let engine = self.clone();
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut feed_events = engine.feed.subscribe();
            let mut interval = tokio::time::interval(Duration::from_millis(
                engine.config.engine.resolution_interval_ms,
            ));

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    event = feed_events.recv() => {
                        use crate::types::FeedEvent;
                        match event {
                            Ok(FeedEvent::Tick { symbol, price, .. }) => {
                                engine.observe_price(&symbol, price);
                            }
                            Ok(FeedEvent::Connected { symbol }) => {
                                let _ = engine.events.send(EngineEvent::FeedConnected { symbol });
                            }
                            Ok(FeedEvent::Disconnected { symbol, reason }) => {
                                let _ = engine
                                    .events
                                    .send(EngineEvent::FeedDisconnected { symbol, reason });
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!("Resolution loop lagged, skipped {} feed events", skipped);
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                    _ = interval.tick() => {
                        let now = chrono::Utc::now().timestamp_millis();
                        engine.resolve_due(now);
                    }
                }
            }
            debug!("Resolution loop stopped");
        });
    }

    fn spawn_balance_loop(self: &Arc<Self>) {
        let engine = self.clone();
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(
                engine.config.engine.balance_poll_ms,
            ));
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = interval.tick() => {
                        engine.refresh_balance().await;
                    }
                }
            }
            debug!("Balance loop stopped");
        });
    }
}

impl Drop for BettingEngine {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
