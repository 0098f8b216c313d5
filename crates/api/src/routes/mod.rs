pub mod health;
pub mod station;
pub mod tracks;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                          WebSocket (station events)
///
/// /station                     now playing (GET)
/// /station/advance             advance the station (POST)
///
/// /tracks                      submit (POST)
/// /tracks/queue                upcoming READY tracks (GET)
/// /tracks/claim                claim oldest PAID track (POST)
/// /tracks/{id}                 get (GET)
/// /tracks/{id}/payment         record payment (POST)
/// /tracks/{id}/claim           claim this PAID track (POST)
/// /tracks/{id}/ready           generation succeeded (POST)
/// /tracks/{id}/fail            generation failed (POST)
/// /tracks/{id}/reactions       like / dislike (POST)
/// /tracks/{id}/archive         retire from replay (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/station", station::router())
        .nest("/tracks", tracks::router())
}
