//! HTTP router and shared application state.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::coordinator::SessionCoordinator;
use crate::websocket::connection::ws_handler;
use crate::websocket::fanout::FanoutRegistry;

/// Shared handles available to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The session state machine.
    pub coordinator: Arc<SessionCoordinator>,
    /// Connection registry and room groups.
    pub fanout: Arc<FanoutRegistry>,
    /// Handle for rendering `/metrics`.
    pub metrics: PrometheusHandle,
    /// Server start time, for the health endpoint's uptime field.
    pub started_at: Instant,
}

impl AppState {
    /// Wire up coordinator, fan-out registry, and metrics handle.
    pub fn new(metrics: PrometheusHandle, history_cap: usize) -> Self {
        let fanout = Arc::new(FanoutRegistry::new());
        let coordinator = Arc::new(SessionCoordinator::new(Arc::clone(&fanout), history_cap));
        Self {
            coordinator,
            fanout,
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// Build the full router: WebSocket endpoint, health/status API, metrics.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /api/health`: liveness check.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

/// `GET /api/status`: connected user count.
async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "connectedUsers": state.coordinator.connected_users(),
        "serverTime": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /metrics`: Prometheus text format.
async fn render_metrics(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// Build an `AppState` backed by a local (non-global) metrics recorder.
#[cfg(test)]
pub fn test_state() -> AppState {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new().build_recorder().handle();
    AppState::new(handle, crate::history::DEFAULT_HISTORY_CAP)
}
