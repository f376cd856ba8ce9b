use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::normalize::LongRow;
use crate::refresh::{current_view, SharedView};
use crate::render::{page::render_page, SnapshotRow};

#[derive(Clone)]
pub struct AppState {
    pub view: SharedView,
    pub refresh: Duration,
}

impl AppState {
    pub fn new(view: SharedView, refresh: Duration) -> Self {
        Self { view, refresh }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/snapshot", get(snapshot))
        .route("/api/series", get(series))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let view = current_view(&state.view);
    Html(render_page(view.as_ref(), state.refresh))
}

#[derive(serde::Serialize)]
struct SnapshotOut {
    timestamp: Option<DateTime<Utc>>,
    refreshed_at: DateTime<Utc>,
    rows: Vec<SnapshotRow>,
}

fn not_ready() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "no successful refresh yet").into_response()
}

async fn snapshot(State(state): State<AppState>) -> Response {
    match current_view(&state.view) {
        Some(v) => Json(SnapshotOut {
            timestamp: v.latest_timestamp,
            refreshed_at: v.refreshed_at,
            rows: v.snapshot,
        })
        .into_response(),
        None => not_ready(),
    }
}

async fn series(State(state): State<AppState>) -> Response {
    match current_view(&state.view) {
        Some(v) => Json::<Vec<LongRow>>(v.series).into_response(),
        None => not_ready(),
    }
}
