//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Broadcast drops total (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Chat messages sent total (counter).
pub const MESSAGES_TOTAL: &str = "chat_messages_total";
/// History evictions total (counter).
pub const HISTORY_EVICTIONS_TOTAL: &str = "chat_history_evictions_total";
/// Room joins total (counter).
pub const ROOM_JOINS_TOTAL: &str = "chat_room_joins_total";
/// Room leaves total (counter).
pub const ROOM_LEAVES_TOTAL: &str = "chat_room_leaves_total";
/// Renames total (counter, labels: status).
pub const RENAMES_TOTAL: &str = "chat_renames_total";
/// Rejected client requests total (counter, labels: op).
pub const REQUESTS_REJECTED_TOTAL: &str = "chat_requests_rejected_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_and_render() {
        // Build a recorder + handle (no global install to avoid test conflicts).
        let handle = PrometheusBuilder::new().build_recorder().handle();

        // Should produce valid (possibly empty) Prometheus text.
        let output = handle.render();
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_BROADCAST_DROPS_TOTAL,
            WS_CONNECTION_DURATION_SECONDS,
            MESSAGES_TOTAL,
            HISTORY_EVICTIONS_TOTAL,
            ROOM_JOINS_TOTAL,
            ROOM_LEAVES_TOTAL,
            RENAMES_TOTAL,
            REQUESTS_REJECTED_TOTAL,
        ];
        for name in names {
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "metric name {name} is not snake_case"
            );
        }
    }
}
