//! WebSocket push channel for alert events.
//!
//! Each connected subscriber gets its own broadcast receiver and has every
//! alert frame forwarded verbatim. A subscriber that falls behind its
//! buffer skips the missed frames and continues; the latch state in the
//! sampler stays consistent either way, so the next genuine transition is
//! still delivered.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, instrument, warn};

use crate::state::SharedState;

/// Handler for the /alerts/ws endpoint.
#[instrument(skip(state, ws))]
pub async fn alerts_ws_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    debug!("Alert subscriber connecting");
    let rx = state.alerts.subscribe();
    ws.on_upgrade(move |socket| forward_alerts(socket, rx))
}

/// Forwards broadcast frames to one subscriber until either side closes.
async fn forward_alerts(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    debug!("Alert subscriber disconnected");
                    break;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!("Alert subscriber lagged, skipped {} events", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
