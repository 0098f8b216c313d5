//! Forwards event bus traffic to connected listeners.

use std::sync::Arc;

use axum::extract::ws::Message;
use station_events::StationEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

pub struct StationRelay {
    ws_manager: Arc<WsManager>,
}

impl StationRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Relay until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<StationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.relay(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Station relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, station relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: &StationEvent) {
        let frame = event.to_wire().to_string();
        let delivered = self.ws_manager.broadcast(Message::Text(frame.into())).await;
        tracing::debug!(event_type = %event.event_type, delivered, "Relayed station event");
    }
}
