mod config;
mod feedback;
mod gateway;
mod services;
mod sources;
mod types;

use config::Config;
use feedback::LoggingFeedback;
use gateway::{ExecutionGateway, HttpGateway, PaperGateway};
use services::BettingEngine;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::EngineEvent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tapline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        "Starting Tapline on {} (feed: {})",
        config.default_asset, config.ws_url
    );

    // Pick the execution gateway: a real execution service when configured,
    // the paper gateway otherwise.
    let gateway: Arc<dyn ExecutionGateway> = match &config.execution_url {
        Some(url) => {
            info!("Using execution service at {}", url);
            Arc::new(HttpGateway::new(url.clone()))
        }
        None => {
            info!("No execution service configured, paper trading with ${:.2}", config.paper_balance);
            Arc::new(PaperGateway::new(config.paper_balance))
        }
    };

    let engine = BettingEngine::new(config, gateway, Arc::new(LoggingFeedback));
    engine.start();

    // Log bet lifecycle events until interrupted.
    let mut events = engine.subscribe();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::BetPlaced { bet, .. } => {
                    info!("event: placed {} on {} at {:.2}x", bet.id, bet.asset, bet.multiplier);
                }
                EngineEvent::BetResolved { resolution, .. } => {
                    info!(
                        "event: {} {} pnl=${:.2}",
                        if resolution.won { "won" } else { "lost" },
                        resolution.bet.id,
                        resolution.pnl
                    );
                }
                EngineEvent::FeedConnected { symbol } => {
                    info!("event: feed up for {}", symbol);
                }
                EngineEvent::FeedDisconnected { symbol, reason } => {
                    info!("event: feed down for {} ({})", symbol, reason);
                }
            }
        }
    });

    // Periodic state summary.
    let summary_engine = engine.clone();
    let summary_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        loop {
            interval.tick().await;
            let view = summary_engine.view();
            info!(
                "{}: price={:?} connected={} active={} available=${:.2} session_pnl=${:.2}",
                view.asset,
                view.current_price,
                view.is_connected,
                view.active_bets.len(),
                view.available_balance,
                view.session_pnl
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    engine.shutdown();
    event_task.abort();
    summary_task.abort();

    Ok(())
}
