//! WebSocket upgrade and per-connection read/write loops.
//!
//! Each accepted socket gets a fresh connection identity, an outbound
//! channel registered with the fan-out registry, and a pair of tasks: one
//! forwarding queued frames to the socket, one parsing inbound frames and
//! dispatching them to the coordinator. Malformed frames are logged and
//! skipped; they never terminate the connection.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use parley_core::events::{ClientEvent, ServerEvent};
use parley_core::ids::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};
use crate::routes::AppState;
use crate::websocket::fanout::{ClientConnection, OUTBOUND_CAPACITY};

/// `GET /ws`: upgrade to a chat session.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = ConnectionId::generate();
    let opened_at = Instant::now();
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(conn_id = %id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(OUTBOUND_CAPACITY);
    state
        .fanout
        .add(Arc::new(ClientConnection::new(id.clone(), tx)));
    state.coordinator.handle_connect(&id);

    let mut write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.as_str().into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            // The writer exits when the fan-out side drops this connection
            // (e.g. slow-client removal) or the socket send fails.
            _ = &mut write_task => break,
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => dispatch(&state, &id, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                Some(Err(e)) => {
                    debug!(conn_id = %id, error = %e, "websocket read error");
                    break;
                }
            },
        }
    }

    write_task.abort();
    state.fanout.remove(&id);
    state.coordinator.handle_disconnect(&id);
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(opened_at.elapsed().as_secs_f64());
    info!(conn_id = %id, "websocket disconnected");
}

/// Parse one inbound frame and dispatch it to the coordinator.
///
/// Every parsed request produces exactly one `ack` frame carrying the
/// request's `seq`; unparseable frames produce none (there is no seq to
/// correlate them with).
fn dispatch(state: &AppState, id: &ConnectionId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(conn_id = %id, error = %e, "ignoring malformed client frame");
            return;
        }
    };

    let seq = event.seq();
    let success = match event {
        ClientEvent::JoinRoom { room, .. } => state.coordinator.join_room(id, &room),
        ClientEvent::LeaveRoom { .. } => state.coordinator.leave_room(id),
        ClientEvent::SendMessage { message, .. } => state.coordinator.send_message(id, &message),
        ClientEvent::SetUsername { username, .. } => state.coordinator.set_username(id, &username),
    };
    state.fanout.send_to(id, &ServerEvent::Ack { seq, success });
}
