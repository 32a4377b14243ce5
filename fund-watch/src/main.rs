//! Fund Terminal watcher
//!
//! Connects the realtime client, logs every typed event it receives and
//! prints a portfolio snapshot from the REST API (or demo data when the
//! backend is down). Runs until Ctrl-C.

mod config;

use fund_api::{ApiClient, PortfolioApi};
use fund_core::{ConnectionStatus, Severity};
use fund_realtime::{HandlerHandle, RealtimeClient};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::WatchConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fund_watch=debug")),
        )
        .init();

    let config = WatchConfig::from_env()?;
    info!("Starting Fund Terminal watcher");
    info!("Realtime endpoint: {}", config.realtime.endpoint);
    info!("API base URL: {}", config.api.base_url);

    let http = ApiClient::new(&config.api)?;
    log_portfolio_snapshot(&PortfolioApi::new(http)).await;

    let client = RealtimeClient::new(config.realtime.clone());
    let _handlers = register_handlers(&client, config.min_confidence);
    spawn_status_logger(&client);

    client.subscribe(config.topics.iter().copied());
    client.connect(config.api.token.as_deref())?;
    info!("Watching {} topic(s), press Ctrl-C to stop", config.topics.len());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    client.disconnect().await;

    Ok(())
}

async fn log_portfolio_snapshot(api: &PortfolioApi) {
    let summary = api.summary_or_demo().await;
    if let Some(reason) = summary.demo_reason() {
        warn!("Portfolio API unavailable, showing demo data ({})", reason);
    }
    let s = &summary.data;
    info!(
        "Portfolio: invested {} | value {} | returns {} ({}%) | {} holding(s)",
        s.total_invested, s.current_value, s.total_returns, s.returns_percent, s.holdings_count
    );

    let allocation = api.allocation_or_demo().await;
    for slice in &allocation.data {
        info!("  {:<8} {:>12} {:>6}%", slice.category, slice.value, slice.percent);
    }
}

fn register_handlers(client: &RealtimeClient, min_confidence: f64) -> Vec<HandlerHandle> {
    vec![
        client.on_market_data(|tick| {
            debug!(
                "NAV {} {} ({:+}%)",
                tick.fund_id, tick.nav, tick.change_percent
            );
        }),
        client.on_portfolio_update(|update| {
            info!(
                "Portfolio {} value {} ({:+} today)",
                update.portfolio_id, update.total_value, update.day_change
            );
        }),
        client.on_prediction(move |prediction| {
            if prediction.is_confident(min_confidence) {
                info!(
                    "Prediction {:?} {} (confidence {:.2})",
                    prediction.signal, prediction.fund_id, prediction.confidence
                );
            } else {
                debug!(
                    "Low-confidence prediction for {} ({:.2})",
                    prediction.fund_id, prediction.confidence
                );
            }
        }),
        client.on_risk_alert(|alert| {
            if alert.severity >= Severity::High {
                error!("[{:?}] {}: {}", alert.severity, alert.title, alert.message);
            } else {
                warn!("[{:?}] {}: {}", alert.severity, alert.title, alert.message);
            }
            if let Some(recommendation) = &alert.recommendation {
                info!("  Recommendation: {}", recommendation);
            }
        }),
        client.on_user_event(|event| {
            debug!("User event {} {:?}", event.event, event.user_id);
        }),
    ]
}

fn spawn_status_logger(client: &RealtimeClient) {
    let mut status = client.status_watch();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            match current {
                ConnectionStatus::Connected => info!("Realtime connected"),
                ConnectionStatus::Connecting => debug!("Realtime connecting"),
                ConnectionStatus::Disconnected => warn!("Realtime disconnected"),
            }
        }
    });
}
