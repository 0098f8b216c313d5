#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sqlx::PgPool;
use station_core::clock::{Clock, ManualClock};
use station_core::types::DbId;
use tower::ServiceExt;

use station_api::config::ServerConfig;
use station_api::router::build_app_router;
use station_api::state::AppState;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
        artifact_dir: std::env::temp_dir().join("station-api-test-artifacts"),
    }
}

/// The full router on a manual clock starting at the current instant.
pub fn build_test_app(pool: PgPool) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = AppState::new(pool, test_config(), clock.clone() as Arc<dyn Clock>);
    (build_app_router(state), clock)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Body::from(json.to_string())).await
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Insert a READY track whose artifact matches its id, created `age_secs` ago.
pub async fn seed_ready(pool: &PgPool, age_secs: i64, duration_secs: i32) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO tracks (prompt, duration_secs, source_id, status_id, created_at) \
         VALUES ('seeded', $1, 1, 4, NOW() - make_interval(secs => $2)) \
         RETURNING id",
    )
    .bind(duration_secs)
    .bind(age_secs as f64)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("UPDATE tracks SET audio_url = '/audio/' || id || '.mp3' WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}
