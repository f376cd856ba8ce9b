// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod audit;
pub mod color;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod refresh;
pub mod render;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::api::AppState;
pub use crate::color::{score_to_style, StyleDescriptor};
pub use crate::ingest::types::{RawRecord, RecordSource};
pub use crate::normalize::{normalize, NormalizeError, NormalizedTable};
pub use crate::snapshot::latest_snapshot;

use axum::Router;

/// Full HTTP surface: dashboard routes plus `/metrics`.
pub fn app(state: AppState, metrics: &crate::metrics::Metrics) -> Router {
    api::create_router(state).merge(metrics.router())
}
