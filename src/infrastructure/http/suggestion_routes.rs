//! Suggestion API routes - Autocomplete for map and world names

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::infrastructure::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MapSuggestionQuery {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct WorldSuggestionQuery {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub loaded_only: bool,
}

/// Map folders of a repository category
pub async fn suggest_maps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MapSuggestionQuery>,
) -> Json<Vec<String>> {
    if !state.config.remote.has_remote_defaults() {
        return Json(Vec::new());
    }
    Json(state.suggestions.suggest(&query.category, &query.prefix).await)
}

/// World names under the worlds root
pub async fn suggest_worlds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WorldSuggestionQuery>,
) -> Json<Vec<String>> {
    Json(
        state
            .worlds
            .suggest_worlds(&query.prefix, query.loaded_only)
            .await,
    )
}
