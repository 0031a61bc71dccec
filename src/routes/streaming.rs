//! Live KPI push over WebSocket.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::state::AppState;

/// Interval between server pings.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Route group for live data.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/live", get(live_socket))
        .route("/stream/info", get(stream_info))
}

/// Stream info response.
#[derive(Debug, Serialize)]
pub struct StreamInfo {
    /// Connected live subscribers.
    pub subscribers: usize,
    /// Milliseconds between updates.
    pub interval_ms: u64,
}

/// `GET /stream/info` - subscriber count and update cadence.
pub async fn stream_info(State(state): State<AppState>) -> Json<StreamInfo> {
    Json(StreamInfo {
        subscribers: state.subscriber_count(),
        interval_ms: state.settings.feed_interval.as_millis() as u64,
    })
}

/// `GET /ws/live` - WebSocket upgrade for live KPI updates.
pub async fn live_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward every live update to one client until either side closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.live.subscribe();
    metrics::set_live_subscribers(state.subscriber_count());
    info!(subscribers = state.subscriber_count(), "Live client connected");

    let mut ping = interval(PING_INTERVAL);
    // Skip the immediate first tick
    ping.tick().await;

    loop {
        tokio::select! {
            result = updates.recv() => {
                match result {
                    Ok(update) => {
                        let json = match serde_json::to_string(&update) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Failed to serialize live update: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("Live client send failed, disconnecting");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Live client lagged, skipping updates");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Live channel closed");
                        break;
                    }
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Live client receive error: {}", e);
                        break;
                    }
                }
            }

            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(updates);
    metrics::set_live_subscribers(state.subscriber_count());
    info!(subscribers = state.subscriber_count(), "Live client disconnected");
}
