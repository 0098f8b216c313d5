use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use station_events::bus::STATION_UPDATE;
use station_events::StationEvent;
use station_scheduler::StationUpdate;

use crate::state::AppState;

/// GET /api/v1/ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Register the listener, greet it with what is on air, then relay until it leaves.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager.add(conn_id.clone()).await;
    tracing::info!(conn_id = %conn_id, "Listener connected");

    if let Some(greeting) = now_playing_frame(&state).await {
        ws_manager.send_to(&conn_id, greeting).await;
    }

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            // Listeners have nothing to say to the station.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Listener disconnected");
}

/// A `station_update` frame for the current state, or `None` if it cannot be read.
async fn now_playing_frame(state: &AppState) -> Option<Message> {
    let (snapshot, _) = match state.scheduler.now_playing().await {
        Ok(now) => now,
        Err(e) => {
            tracing::warn!(error = %e, "Could not load station state for new listener");
            return None;
        }
    };

    let update = StationUpdate {
        current_track_id: snapshot.state.current_track_id,
        current_started_at: snapshot.state.current_started_at,
        current_track: snapshot.current,
    };
    let payload = serde_json::to_value(&update).ok()?;
    let frame = StationEvent::new(STATION_UPDATE)
        .with_track(update.current_track_id)
        .with_payload(payload)
        .to_wire();
    Some(Message::Text(frame.to_string().into()))
}
