//! # Server — REST API for Research Records
//!
//! Runs an Axum HTTP server exposing the research store and its catalogs as
//! JSON resources, plus health and metrics endpoints.
//!
//! | Resource | Module |
//! |----------|--------|
//! | `/api/Researches` | [`routes_researches`] |
//! | `/api/Fields`, `/api/Tags`, `/api/Authors` | [`routes_catalog`] |
//! | `/healthz`, `/readyz`, `/metrics` | [`routes_health`] |
//!
//! Collection routes are registered with and without the trailing slash.

mod routes_catalog;
mod routes_health;
mod routes_researches;

use crate::{db, models, prom_metrics};
use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

pub struct AppState {
    pub db: db::Database,
    pub prom_metrics: prom_metrics::Metrics,
    /// Row cap for listing endpoints, never above [`models::MAX_TOP`].
    pub max_top: i64,
}

impl AppState {
    pub fn with_db(db: db::Database, max_top: i64) -> Arc<Self> {
        Arc::new(AppState {
            db,
            prom_metrics: prom_metrics::Metrics::new(),
            max_top: max_top.clamp(1, models::MAX_TOP),
        })
    }
}

/// Middleware that records HTTP request duration into the Prometheus histogram,
/// generates (or propagates) a request ID for correlation, and wraps the
/// request in a tracing span.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Normalize URL path to collapse numeric ids into a placeholder, keeping
/// histogram label cardinality bounded.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()) {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let researches = get(routes_researches::handler_researches_list)
        .post(routes_researches::handler_research_create);
    let research = get(routes_researches::handler_research_get)
        .put(routes_researches::handler_research_update)
        .delete(routes_researches::handler_research_delete);

    let fields =
        get(routes_catalog::handler_fields_list).post(routes_catalog::handler_field_create);
    let tags = get(routes_catalog::handler_tags_list).post(routes_catalog::handler_tag_create);
    let authors =
        get(routes_catalog::handler_authors_list).post(routes_catalog::handler_author_create);

    Router::new()
        .route("/api/Researches", researches.clone())
        .route("/api/Researches/", researches)
        .route("/api/Researches/{id}", research)
        .route("/api/Fields", fields.clone())
        .route("/api/Fields/", fields)
        .route("/api/Fields/{id}", get(routes_catalog::handler_field_get))
        .route("/api/Tags", tags.clone())
        .route("/api/Tags/", tags)
        .route("/api/Tags/{id}", get(routes_catalog::handler_tag_get))
        .route("/api/Authors", authors.clone())
        .route("/api/Authors/", authors)
        .route("/api/Authors/{id}", get(routes_catalog::handler_author_get))
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}

pub async fn run(port: u16, database: db::Database, max_top: i64) -> Result<()> {
    let state = AppState::with_db(database, max_top);
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, max_top, "research API running");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("research API shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_preserves_api_routes() {
        assert_eq!(normalize_path("/api/Researches"), "/api/Researches");
        assert_eq!(normalize_path("/api/Researches/"), "/api/Researches/");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn normalize_path_collapses_numeric_ids() {
        assert_eq!(normalize_path("/api/Researches/42"), "/api/Researches/:id");
        assert_eq!(normalize_path("/api/Tags/7"), "/api/Tags/:id");
    }

    #[test]
    fn normalize_path_keeps_non_numeric_segments() {
        assert_eq!(normalize_path("/api/Researches/abc"), "/api/Researches/abc");
        assert_eq!(normalize_path("/api/Researches/-1"), "/api/Researches/-1");
    }

    #[test]
    fn normalize_path_handles_empty_and_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "");
    }

    #[tokio::test]
    async fn app_state_clamps_max_top() {
        let db = db::Database::connect_lazy("postgres://localhost/unused", 1).unwrap();
        assert_eq!(AppState::with_db(db.clone(), 1_000).max_top, models::MAX_TOP);
        assert_eq!(AppState::with_db(db.clone(), 0).max_top, 1);
        assert_eq!(AppState::with_db(db, 25).max_top, 25);
    }
}
