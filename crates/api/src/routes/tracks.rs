//! Route definitions for the `/tracks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tracks;
use crate::state::AppState;

/// ```text
/// POST /                    -> submit
/// GET  /queue               -> queue (?limit=)
/// POST /claim               -> claim_next
/// GET  /{id}                -> get_by_id
/// POST /{id}/payment        -> record_payment
/// POST /{id}/claim          -> claim_by_id
/// POST /{id}/ready          -> mark_ready
/// POST /{id}/fail           -> mark_failed
/// POST /{id}/reactions      -> react
/// POST /{id}/archive        -> archive
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tracks::submit))
        .route("/queue", get(tracks::queue))
        .route("/claim", post(tracks::claim_next))
        .route("/{id}", get(tracks::get_by_id))
        .route("/{id}/payment", post(tracks::record_payment))
        .route("/{id}/claim", post(tracks::claim_by_id))
        .route("/{id}/ready", post(tracks::mark_ready))
        .route("/{id}/fail", post(tracks::mark_failed))
        .route("/{id}/reactions", post(tracks::react))
        .route("/{id}/archive", post(tracks::archive))
}
