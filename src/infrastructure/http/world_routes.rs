//! World API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error_response;
use crate::application::ports::outbound::SharedLink;
use crate::domain::entities::{WorldState, WorldSummary};
use crate::domain::value_objects::{SpawnRecord, WorldName};
use crate::infrastructure::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListWorldsQuery {
    #[serde(default)]
    pub loaded_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorldRequest {
    pub name: String,
}

/// Spawn position; the world is taken from the path
#[derive(Debug, Deserialize)]
pub struct SpawnRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

#[derive(Debug, Serialize)]
pub struct WorldResponse {
    pub name: WorldName,
    pub state: WorldState,
}

impl WorldResponse {
    fn new(name: WorldName, state: WorldState) -> Self {
        Self { name, state }
    }
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub name: WorldName,
    pub exists: bool,
}

/// List worlds under the worlds root
pub async fn list_worlds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListWorldsQuery>,
) -> Result<Json<Vec<WorldSummary>>, (StatusCode, String)> {
    let worlds = state
        .worlds
        .list(query.loaded_only)
        .await
        .map_err(error_response)?;

    Ok(Json(worlds))
}

/// Create a new void world; it is left loaded
pub async fn create_world(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWorldRequest>,
) -> Result<(StatusCode, Json<WorldResponse>), (StatusCode, String)> {
    let name = state.worlds.create(&req.name).await.map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(WorldResponse::new(name, WorldState::Loaded)),
    ))
}

/// Get a world's life-cycle state
pub async fn get_world(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<WorldResponse>, (StatusCode, String)> {
    let parsed = WorldName::parse(&name).map_err(error_response)?;
    let world_state = state.worlds.state(&name).await.map_err(error_response)?;
    if !world_state.exists() {
        return Err((StatusCode::NOT_FOUND, format!("World not found: {}", parsed)));
    }

    Ok(Json(WorldResponse::new(parsed, world_state)))
}

/// Whether a world directory exists, loaded or not
pub async fn world_exists(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ExistsResponse>, (StatusCode, String)> {
    let parsed = WorldName::parse(&name).map_err(error_response)?;
    let exists = state.worlds.exists(&name).await.map_err(error_response)?;

    Ok(Json(ExistsResponse {
        name: parsed,
        exists,
    }))
}

pub async fn load_world(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<WorldResponse>, (StatusCode, String)> {
    let name = state.worlds.load(&name).await.map_err(error_response)?;

    Ok(Json(WorldResponse::new(name, WorldState::Loaded)))
}

/// Save and unload a world
pub async fn unload_world(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<WorldResponse>, (StatusCode, String)> {
    let name = state.worlds.unload(&name).await.map_err(error_response)?;

    Ok(Json(WorldResponse::new(name, WorldState::Unloaded)))
}

/// Delete an unloaded world
pub async fn delete_world(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.worlds.delete(&name).await.map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_spawn(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SpawnRecord>, (StatusCode, String)> {
    let spawn = state.worlds.spawn(&name).await.map_err(error_response)?;

    Ok(Json(spawn))
}

pub async fn set_spawn(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SpawnRequest>,
) -> Result<Json<SpawnRecord>, (StatusCode, String)> {
    let record = SpawnRecord::new(name.as_str(), req.x, req.y, req.z).with_rotation(req.yaw, req.pitch);
    let name = state
        .worlds
        .set_spawn(&name, record.clone())
        .await
        .map_err(error_response)?;

    Ok(Json(SpawnRecord {
        world: name.to_string(),
        ..record
    }))
}

/// Zip a world and publish a one-time download link
pub async fn export_world(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SharedLink>, (StatusCode, String)> {
    let link = state.exports.export(&name).await.map_err(error_response)?;

    Ok(Json(link))
}
