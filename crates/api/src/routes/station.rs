//! Route definitions for the `/station` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::station;
use crate::state::AppState;

/// ```text
/// GET  /           -> now_playing
/// POST /advance    -> advance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(station::now_playing))
        .route("/advance", post(station::advance))
}
