//! Import API routes

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::error_response;
use crate::application::services::ImportOutcome;
use crate::infrastructure::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RemoteImportRequest {
    pub category: String,
    pub map: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlImportRequest {
    pub world_name: String,
    pub url: String,
}

/// Import `<category>/<map>` from the configured repository
pub async fn import_remote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoteImportRequest>,
) -> Result<(StatusCode, Json<ImportOutcome>), (StatusCode, String)> {
    let outcome = state
        .imports
        .import_remote(&req.category, &req.map)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Import a zipped world from a URL
pub async fn import_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlImportRequest>,
) -> Result<(StatusCode, Json<ImportOutcome>), (StatusCode, String)> {
    let outcome = state
        .imports
        .import_url(&req.world_name, &req.url)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Categories accepted by remote imports
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.config.remote.categories.clone())
}
