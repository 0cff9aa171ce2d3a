//! Bet resolution monitor.
//!
//! Tracks the high/low price excursion of every active bet since placement
//! and decides win/loss/expiry on a fixed evaluation cadence. The excursion
//! is what makes resolution path-sensitive: a price can touch a target and
//! retreat between two evaluation passes, and the recorded high/low still
//! captures the touch.
//!
//! Evaluation order per bet: target touch first, expiry second. A bet whose
//! window has expired but whose path touched the target resolves as a win.

use crate::services::ledger::BetLedger;
use crate::types::{BetResolution, Direction, TapBet};
use dashmap::DashMap;
use tracing::{debug, info};

/// Running price extremes observed since a bet was placed.
#[derive(Debug, Clone, Copy)]
struct Excursion {
    high: f64,
    low: f64,
}

/// Path-sensitive win/loss evaluator for active bets.
#[derive(Default)]
pub struct BetMonitor {
    /// Excursion per active bet id.
    excursions: DashMap<String, Excursion>,
}

impl BetMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly placed bet, seeded at its entry price.
    pub fn track(&self, bet: &TapBet) {
        self.excursions.insert(
            bet.id.clone(),
            Excursion {
                high: bet.entry_price,
                low: bet.entry_price,
            },
        );
    }

    /// Fold a new price observation into the excursions of every active bet
    /// on the symbol. An entry missing its seed (placement raced the tick)
    /// is created from the bet's entry price first.
    pub fn observe_tick(&self, ledger: &BetLedger, symbol: &str, price: f64) {
        for bet in ledger.active_bets_for(symbol) {
            let mut excursion = self.excursions.entry(bet.id.clone()).or_insert(Excursion {
                high: bet.entry_price,
                low: bet.entry_price,
            });
            excursion.high = excursion.high.max(price);
            excursion.low = excursion.low.min(price);
        }
    }

    /// Evaluate every active bet against its excursion and the clock.
    ///
    /// Resolved bets are removed from the ledger's active set and their
    /// tracking state discarded; the resolutions are returned for event
    /// emission. Stale excursion entries are purged to bound memory.
    pub fn evaluate(&self, ledger: &BetLedger, now: i64) -> Vec<BetResolution> {
        let mut resolutions = Vec::new();

        for bet in ledger.active_bets() {
            let excursion = self
                .excursions
                .get(&bet.id)
                .map(|e| *e.value())
                .unwrap_or(Excursion {
                    high: bet.entry_price,
                    low: bet.entry_price,
                });

            let touched = match bet.direction {
                Direction::Long => excursion.high >= bet.target_price,
                Direction::Short => excursion.low <= bet.target_price,
            };

            if touched {
                if let Some(resolution) = ledger.resolve(&bet.id, true, now) {
                    info!(
                        "Bet WON: {} {} touched {} (excursion high={} low={}) payout=${:.2}",
                        bet.id,
                        bet.asset,
                        bet.target_price,
                        excursion.high,
                        excursion.low,
                        resolution.payout.unwrap_or(0.0)
                    );
                    self.excursions.remove(&bet.id);
                    resolutions.push(resolution);
                }
            } else if now >= bet.expires_at {
                if let Some(resolution) = ledger.resolve(&bet.id, false, now) {
                    debug!(
                        "Bet LOST: {} {} expired untouched (target {}, high={} low={})",
                        bet.id, bet.asset, bet.target_price, excursion.high, excursion.low
                    );
                    self.excursions.remove(&bet.id);
                    resolutions.push(resolution);
                }
            }
        }

        // Drop tracking state for bets no longer active (resolved above or
        // removed elsewhere).
        self.excursions.retain(|id, _| ledger.contains_active(id));

        resolutions
    }

    /// Number of bets currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.excursions.len()
    }
}
