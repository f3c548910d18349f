// =============================================================================
// Status API — Axum 0.7
// =============================================================================
//
// Read-only view of the signal board. All endpoints live under `/api/v1/`
// and need no authentication; nothing here can change engine behaviour.
//
// CORS is configured permissively so a local chart page can poll it.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SignalBoard;
use crate::types::Pair;

// =============================================================================
// Router construction
// =============================================================================

/// Build the status router with CORS middleware and shared board.
pub fn router(board: Arc<SignalBoard>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/signals", get(signals))
        .route("/api/v1/signals/:pair", get(signal_for_pair))
        .route("/api/v1/errors", get(errors))
        .layer(cors)
        .with_state(board)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
    pairs: Vec<Pair>,
}

async fn health(State(board): State<Arc<SignalBoard>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: board.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: board.uptime_secs(),
        pairs: board.pairs.clone(),
    })
}

// =============================================================================
// Signals
// =============================================================================

async fn signals(State(board): State<Arc<SignalBoard>>) -> impl IntoResponse {
    Json(board.latest_decisions())
}

async fn signal_for_pair(
    State(board): State<Arc<SignalBoard>>,
    Path(pair): Path<String>,
) -> impl IntoResponse {
    let pair = Pair::new(pair);
    match board.decision(&pair) {
        Some(decision) => Json(decision).into_response(),
        None => {
            let body = serde_json::json!({
                "error": format!("no decision recorded for {pair}"),
            });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

async fn errors(State(board): State<Arc<SignalBoard>>) -> impl IntoResponse {
    Json(board.recent_errors())
}
