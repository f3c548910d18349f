// =============================================================================
// Candle Signal — Main Entry Point
// =============================================================================
//
// Polls one-minute candles for every configured pair, computes the indicator
// set and logs a buy / no-buy decision per pair and cycle. A failed pair is
// logged and recorded; the loop keeps going.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod bittrex;
mod decision;
mod engine;
mod indicators;
mod market_data;
mod plot;
mod runtime_config;
mod signal;
mod types;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::SignalBoard;
use crate::bittrex::TickerClient;
use crate::engine::SignalEngine;
use crate::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "signal_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Candle Signal starting up");

    let config_path =
        std::env::var("CANDLE_SIGNAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override pairs from env if available.
    if let Ok(pairs) = std::env::var("CANDLE_SIGNAL_PAIRS") {
        config.override_pairs(&pairs);
    }
    config.validate()?;

    info!(
        pairs = ?config.pairs,
        poll_interval_secs = config.poll_interval_secs,
        lookback_hours = config.lookback_hours,
        freshness_minutes = config.freshness_minutes,
        "Configured signal pairs"
    );

    // ── 2. Shared state & client ─────────────────────────────────────────
    let config = Arc::new(config);
    let board = Arc::new(SignalBoard::new(config.pairs.clone()));
    let client = TickerClient::from_config(&config)?;

    // ── 3. Status API (optional) ─────────────────────────────────────────
    if let Some(bind_addr) = config.api_bind_addr.clone() {
        let api_board = board.clone();
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(addr = %bind_addr, error = %e, "Failed to bind status API");
                    return;
                }
            };
            info!(addr = %bind_addr, "Status API listening");
            if let Err(e) = axum::serve(listener, api::rest::router(api_board)).await {
                error!(error = %e, "Status API failed");
            }
        });
    }

    // ── 4. Poll loop ─────────────────────────────────────────────────────
    let poll_config = config.clone();
    let poll_board = board.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            poll_config.poll_interval_secs,
        ));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_cycle(&client, &poll_config, &poll_board).await;
        }
    });

    info!("Polling started. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping");

    info!(
        uptime_secs = board.uptime_secs(),
        "Candle Signal shut down complete."
    );
    Ok(())
}

/// Evaluate every pair once, sequentially. Errors are logged and recorded.
async fn run_cycle(client: &TickerClient, config: &RuntimeConfig, board: &SignalBoard) {
    for pair in &config.pairs {
        match SignalEngine::evaluate_pair(client, config, pair).await {
            Ok(evaluation) => {
                if let Some(dir) = &config.plot_dir {
                    if let Err(e) =
                        plot::export_chart(dir, pair, &evaluation.series, &config.indicators)
                    {
                        warn!(pair = %pair, error = %e, "chart export failed");
                    }
                }
                board.record_decision(evaluation.decision);
            }
            Err(e) => {
                error!(pair = %pair, error = %e, "pair evaluation failed");
                board.push_error(pair, &e);
            }
        }
    }
}
