//! Source status API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use advisor_core::{SourceStatus, TieringPolicy};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    /// Sources that would be called right now.
    pub configured: usize,
    pub tiering: TieringPolicy,
    pub sources: Vec<SourceStatus>,
}

/// GET /api/sources
///
/// Every enabled source with its configuration and the outcome of its most
/// recent call.
pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
    let aggregator = state.aggregator();
    Json(SourcesResponse {
        configured: aggregator.configured_sources(),
        tiering: aggregator.policy(),
        sources: aggregator.source_status().await,
    })
}
