//! Feedback sinks.
//!
//! Fire-and-forget notifications for placement, win, and loss; sound and
//! haptics live behind this seam, outside the engine. Sinks must return
//! quickly and never fail.

use crate::types::{BetResolution, TapBet};
use tracing::info;

/// Receiver of bet lifecycle notifications.
pub trait FeedbackSink: Send + Sync {
    fn bet_placed(&self, _bet: &TapBet) {}
    fn bet_won(&self, _resolution: &BetResolution) {}
    fn bet_lost(&self, _resolution: &BetResolution) {}
}

/// Sink that ignores every notification.
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {}

/// Sink that logs each notification.
pub struct LoggingFeedback;

impl FeedbackSink for LoggingFeedback {
    fn bet_placed(&self, bet: &TapBet) {
        info!("placed {} on {} at {:.2}x", bet.id, bet.asset, bet.multiplier);
    }

    fn bet_won(&self, resolution: &BetResolution) {
        info!(
            "won {} (+${:.2})",
            resolution.bet.id,
            resolution.payout.unwrap_or(0.0)
        );
    }

    fn bet_lost(&self, resolution: &BetResolution) {
        info!("lost {} (-${:.2})", resolution.bet.id, resolution.bet.stake);
    }
}
