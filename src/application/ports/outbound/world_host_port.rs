//! World host port - The storage engine that simulates loaded worlds
//!
//! The registry actor owns its host exclusively and calls it from a single
//! task, so the methods take `&mut self` and run synchronously.

use std::path::Path;

use crate::domain::errors::WorldError;
use crate::domain::value_objects::{LevelSettings, SpawnRecord, WorldName};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("World is not loaded: {0}")]
    NotLoaded(String),

    #[error("World directory missing: {0}")]
    MissingDirectory(String),

    #[error("Level data is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HostError> for WorldError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotLoaded(name) => WorldError::invalid_state(name, "is not loaded"),
            HostError::MissingDirectory(name) => WorldError::NotFound(name),
            HostError::Corrupt(msg) => WorldError::ValidationFailure(msg),
            HostError::Io(e) => WorldError::Io(e.to_string()),
        }
    }
}

pub trait WorldHostPort: Send {
    /// Generate an empty world in `dir` and leave it loaded
    fn generate(&mut self, name: &WorldName, dir: &Path) -> Result<(), HostError>;

    /// Load an existing world directory; a no-op when already loaded
    fn load(&mut self, name: &WorldName, dir: &Path) -> Result<(), HostError>;

    /// Unload a world, flushing in-memory state first when `save` is set
    fn unload(&mut self, name: &WorldName, save: bool) -> Result<(), HostError>;

    /// Flush a loaded world's in-memory state to its directory
    fn save(&mut self, name: &WorldName) -> Result<(), HostError>;

    fn is_loaded(&self, name: &WorldName) -> bool;

    fn loaded_worlds(&self) -> Vec<WorldName>;

    /// The engine's own spawn point for a world, loaded or not
    fn spawn_point(&self, name: &WorldName, dir: &Path) -> Result<SpawnRecord, HostError>;

    fn set_spawn_point(&mut self, name: &WorldName, spawn: &SpawnRecord) -> Result<(), HostError>;

    fn apply_settings(&mut self, name: &WorldName, settings: &LevelSettings) -> Result<(), HostError>;
}
