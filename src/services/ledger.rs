//! In-memory bet ledger.
//!
//! Owns the active bet set, the append-only completed log, the externally
//! sourced account balance, session PnL, and session counters. Active-set
//! membership is the sole source of truth for outstanding exposure: the
//! available balance is derived (external balance minus active stakes),
//! never decremented, so a failed placement can't double-count a stake.
//!
//! `resolve` is the single transition out of `Active` and removes the bet
//! from the active map first, so a bet can reach a terminal state at most
//! once even if resolution is attempted twice.

use crate::types::{BetResolution, BetStatus, SessionStats, TapBet};
use dashmap::DashMap;
use std::sync::Mutex;
use tracing::info;

/// In-memory store of bets and session accounting.
pub struct BetLedger {
    /// Bets awaiting resolution, keyed by id.
    active: DashMap<String, TapBet>,
    /// Resolved bets, oldest first.
    completed: Mutex<Vec<TapBet>>,
    /// Withdrawable balance reported by the account source.
    external_balance: Mutex<f64>,
    /// Accumulated PnL across this session's resolutions.
    session_pnl: Mutex<f64>,
    stats: Mutex<SessionStats>,
}

impl BetLedger {
    /// Create an empty ledger with a starting external balance.
    pub fn new(external_balance: f64) -> Self {
        Self {
            active: DashMap::new(),
            completed: Mutex::new(Vec::new()),
            external_balance: Mutex::new(external_balance),
            session_pnl: Mutex::new(0.0),
            stats: Mutex::new(SessionStats::default()),
        }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Add a freshly placed bet to the active set.
    pub fn insert(&self, bet: TapBet) {
        debug_assert_eq!(bet.status, BetStatus::Active);
        info!(
            "Bet placed: {} {} {} stake=${:.2} target={} entry={} mult={:.2}x expires={}",
            bet.id, bet.asset, bet.direction, bet.stake, bet.target_price, bet.entry_price,
            bet.multiplier, bet.expires_at
        );
        self.active.insert(bet.id.clone(), bet);
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve an active bet as won or lost. Returns None if the bet is not
    /// in the active set (already resolved or never placed).
    pub fn resolve(&self, bet_id: &str, won: bool, now: i64) -> Option<BetResolution> {
        let (_, mut bet) = self.active.remove(bet_id)?;

        let (pnl, payout) = if won {
            let payout = bet.stake * bet.multiplier;
            (bet.stake * (bet.multiplier - 1.0), Some(payout))
        } else {
            (-bet.stake, None)
        };

        bet.status = if won { BetStatus::Won } else { BetStatus::Lost };
        bet.result_pnl = Some(pnl);
        bet.resolved_at = Some(now);

        *self.session_pnl.lock().unwrap() += pnl;
        self.update_stats(&bet, won, payout);
        self.completed.lock().unwrap().push(bet.clone());

        Some(BetResolution { bet, won, payout, pnl })
    }

    fn update_stats(&self, bet: &TapBet, won: bool, payout: Option<f64>) {
        let mut stats = self.stats.lock().unwrap();
        stats.total_bets += 1;
        stats.total_wagered += bet.stake;
        if won {
            stats.total_won += 1;
            if let Some(payout) = payout {
                stats.total_payout += payout;
            }
            if bet.multiplier > stats.best_multiplier_hit {
                stats.best_multiplier_hit = bet.multiplier;
            }
        } else {
            stats.total_lost += 1;
        }
        stats.net_pnl += bet.result_pnl.unwrap_or(0.0);
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Record the latest externally reported withdrawable balance.
    pub fn set_external_balance(&self, balance: f64) {
        *self.external_balance.lock().unwrap() = balance;
    }

    /// External balance minus the sum of active stakes.
    pub fn available_balance(&self) -> f64 {
        *self.external_balance.lock().unwrap() - self.staked_total()
    }

    /// Sum of stakes across active bets.
    pub fn staked_total(&self) -> f64 {
        self.active.iter().map(|b| b.stake).sum()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn contains_active(&self, bet_id: &str) -> bool {
        self.active.contains_key(bet_id)
    }

    /// Snapshot of all active bets.
    pub fn active_bets(&self) -> Vec<TapBet> {
        self.active.iter().map(|b| b.value().clone()).collect()
    }

    /// Active bets opened on a given symbol.
    pub fn active_bets_for(&self, asset: &str) -> Vec<TapBet> {
        self.active
            .iter()
            .filter(|b| b.asset.eq_ignore_ascii_case(asset))
            .map(|b| b.value().clone())
            .collect()
    }

    /// Whether any active bet references the symbol.
    pub fn has_active_on(&self, asset: &str) -> bool {
        self.active.iter().any(|b| b.asset.eq_ignore_ascii_case(asset))
    }

    /// Snapshot of the completed log, oldest first.
    pub fn completed_bets(&self) -> Vec<TapBet> {
        self.completed.lock().unwrap().clone()
    }

    pub fn session_pnl(&self) -> f64 {
        *self.session_pnl.lock().unwrap()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn sample_bet(id: &str, stake: f64, multiplier: f64) -> TapBet {
        TapBet {
            id: id.to_string(),
            asset: "BTC".to_string(),
            direction: Direction::Long,
            stake,
            target_price: 60105.0,
            entry_price: 60000.0,
            multiplier,
            leverage: 1.0,
            placed_at: 0,
            expires_at: 10_000,
            status: BetStatus::Active,
            result_pnl: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_available_balance_derived_from_active_stakes() {
        let ledger = BetLedger::new(1_000.0);
        assert_eq!(ledger.available_balance(), 1_000.0);

        ledger.insert(sample_bet("a", 50.0, 2.0));
        ledger.insert(sample_bet("b", 25.0, 3.0));
        assert_eq!(ledger.available_balance(), 925.0);

        // Resolution releases the stake regardless of outcome.
        ledger.resolve("a", false, 10_000).unwrap();
        assert_eq!(ledger.available_balance(), 975.0);
    }

    #[test]
    fn test_win_resolution_pnl() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 50.0, 2.0));

        let resolution = ledger.resolve("a", true, 5_000).unwrap();
        assert!(resolution.won);
        assert_eq!(resolution.pnl, 50.0);
        assert_eq!(resolution.payout, Some(100.0));
        assert_eq!(resolution.bet.status, BetStatus::Won);
        assert_eq!(resolution.bet.resolved_at, Some(5_000));
        assert_eq!(ledger.session_pnl(), 50.0);
    }

    #[test]
    fn test_loss_resolution_pnl() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 50.0, 2.0));

        let resolution = ledger.resolve("a", false, 11_000).unwrap();
        assert!(!resolution.won);
        assert_eq!(resolution.pnl, -50.0);
        assert_eq!(resolution.payout, None);
        assert_eq!(resolution.bet.status, BetStatus::Lost);
        assert_eq!(ledger.session_pnl(), -50.0);
    }

    #[test]
    fn test_resolve_is_exactly_once() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 50.0, 2.0));

        assert!(ledger.resolve("a", true, 5_000).is_some());
        assert!(ledger.resolve("a", true, 5_000).is_none());
        assert!(ledger.resolve("a", false, 5_000).is_none());

        assert_eq!(ledger.completed_bets().len(), 1);
        assert_eq!(ledger.session_pnl(), 50.0);
    }

    #[test]
    fn test_resolve_unknown_bet() {
        let ledger = BetLedger::new(1_000.0);
        assert!(ledger.resolve("missing", true, 0).is_none());
    }

    #[test]
    fn test_completed_log_appends_in_order() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 10.0, 2.0));
        ledger.insert(sample_bet("b", 10.0, 2.0));

        ledger.resolve("a", true, 1_000).unwrap();
        ledger.resolve("b", false, 2_000).unwrap();

        let completed = ledger.completed_bets();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].id, "a");
        assert_eq!(completed[1].id, "b");
    }

    #[test]
    fn test_stats_track_resolutions() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 50.0, 4.0));
        ledger.insert(sample_bet("b", 20.0, 2.0));

        ledger.resolve("a", true, 1_000).unwrap();
        ledger.resolve("b", false, 2_000).unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.total_bets, 2);
        assert_eq!(stats.total_won, 1);
        assert_eq!(stats.total_lost, 1);
        assert_eq!(stats.total_wagered, 70.0);
        assert_eq!(stats.total_payout, 200.0);
        assert_eq!(stats.net_pnl, 130.0);
        assert_eq!(stats.best_multiplier_hit, 4.0);
    }

    #[test]
    fn test_active_bets_for_symbol() {
        let ledger = BetLedger::new(1_000.0);
        ledger.insert(sample_bet("a", 10.0, 2.0));
        let mut eth = sample_bet("b", 10.0, 2.0);
        eth.asset = "ETH".to_string();
        ledger.insert(eth);

        assert_eq!(ledger.active_bets_for("BTC").len(), 1);
        assert_eq!(ledger.active_bets_for("eth").len(), 1);
        assert!(ledger.has_active_on("ETH"));
        assert!(!ledger.has_active_on("SOL"));
    }
}
