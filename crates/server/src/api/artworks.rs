//! Artwork API handlers.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use advisor_core::Artwork;

use super::handlers::{bad_request, ApiError};
use crate::state::AppState;

/// Results per search when `limit` is not given.
const DEFAULT_SEARCH_LIMIT: usize = 20;

// ============================================================================
// Request/Response types
// ============================================================================

/// Numbers arrive as raw strings so a bad value gets our own 400 body
/// instead of the extractor's plain-text rejection.
#[derive(Debug, Deserialize)]
pub struct ArtworksParams {
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default, rename = "existingIds")]
    pub existing_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtworksResponse {
    pub artworks: Vec<Artwork>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/artworks?count=&existingIds=
///
/// Without `existingIds` this is an initial (tiered) fetch. With it, even
/// when empty, artworks the client already has are excluded.
pub async fn list_artworks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ArtworksParams>,
) -> Result<Json<ArtworksResponse>, ApiError> {
    let limits = &state.config().aggregator;
    let count = parse_amount(
        "count",
        params.count.as_deref(),
        limits.default_count,
        limits.max_count,
    )
    .map_err(bad_request)?;

    let artworks = match params.existing_ids.as_deref() {
        Some(raw) => {
            let seen = parse_existing_ids(raw);
            debug!(count, seen = seen.len(), "Fetching more artworks");
            state.aggregator().fetch_more(&seen, count).await
        }
        None => {
            debug!(count, "Fetching initial artworks");
            state.aggregator().fetch_initial(count).await
        }
    };

    Ok(Json(ArtworksResponse { artworks }))
}

/// GET /api/artworks/search?q=&limit=
pub async fn search_artworks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ArtworksResponse>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("Query parameter 'q' is required"))?;

    let limit = parse_amount(
        "limit",
        params.limit.as_deref(),
        DEFAULT_SEARCH_LIMIT,
        state.config().aggregator.max_count,
    )
    .map_err(bad_request)?;

    let artworks = state.aggregator().search(query, limit).await;
    Ok(Json(ArtworksResponse { artworks }))
}

// ============================================================================
// Parameter parsing
// ============================================================================

/// Parse a non-negative integer parameter, defaulting when absent and
/// capping at `max`.
fn parse_amount(
    name: &str,
    raw: Option<&str>,
    default: usize,
    max: usize,
) -> Result<usize, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default.min(max)),
        Some(raw) => raw,
    };
    raw.parse::<usize>()
        .map(|value| value.min(max))
        .map_err(|_| format!("'{}' must be a non-negative integer, got '{}'", name, raw))
}

/// Split a comma-separated id list, ignoring blank entries.
fn parse_existing_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
