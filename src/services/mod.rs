pub mod engine;
pub mod feed;
pub mod grid;
pub mod ledger;
pub mod monitor;

pub use engine::BettingEngine;
pub use feed::FeedStore;
pub use ledger::BetLedger;
pub use monitor::BetMonitor;
