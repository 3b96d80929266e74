//! Probes and metrics scraping for the research API.
//!
//! `/healthz` answers as long as the router is up. `/readyz` only answers 200
//! once the research store can run a query, so a replica whose pool cannot
//! reach PostgreSQL is taken out of rotation. Both bodies are small JSON
//! objects; `/metrics` is OpenMetrics text.

use super::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Upper bound on the readiness query.
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug, Serialize)]
struct Readiness {
    status: &'static str,
    database: &'static str,
    pool_size: u32,
    pool_idle: usize,
}

pub(super) async fn handler_healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// 200 when `SELECT 1` succeeds within [`READINESS_TIMEOUT`], 503 otherwise.
/// The body names the failure and reports pool occupancy.
pub(super) async fn handler_readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(READINESS_TIMEOUT, state.db.health_check()).await {
        Ok(Ok(())) => "ok",
        Ok(Err(e)) => {
            warn!(error = %e, "research store unreachable");
            "unreachable"
        }
        Err(_) => {
            warn!(timeout_ms = READINESS_TIMEOUT.as_millis() as u64, "research store timed out");
            "timeout"
        }
    };
    let (code, status) = if database == "ok" {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    let pool = state.db.pool();
    let body = Readiness {
        status,
        database,
        pool_size: pool.size(),
        pool_idle: pool.num_idle(),
    };
    (code, Json(body))
}

pub(super) async fn handler_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
        state.prom_metrics.encode(),
    )
}
