//! World registry port - The serialized commit path for world state
//!
//! Every mutation of a world's directory or loaded state goes through this
//! port. Implementations must apply requests one at a time.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::entities::{WorldState, WorldSummary};
use crate::domain::errors::WorldError;
use crate::domain::value_objects::{SpawnRecord, WorldName};

#[async_trait]
pub trait WorldRegistryPort: Send + Sync {
    /// Canonical directory of a world, whether or not it exists yet
    fn world_dir(&self, name: &WorldName) -> PathBuf;

    async fn state(&self, name: &WorldName) -> Result<WorldState, WorldError>;

    async fn list(&self, loaded_only: bool) -> Result<Vec<WorldSummary>, WorldError>;

    async fn create(&self, name: &WorldName) -> Result<(), WorldError>;

    async fn load(&self, name: &WorldName) -> Result<(), WorldError>;

    async fn unload(&self, name: &WorldName) -> Result<(), WorldError>;

    async fn delete(&self, name: &WorldName) -> Result<(), WorldError>;

    /// Move a validated tree into the world directory and load it
    async fn import_commit(&self, name: &WorldName, source: &Path) -> Result<(), WorldError>;

    /// Flush a loaded world; a no-op for unloaded worlds
    async fn save(&self, name: &WorldName) -> Result<(), WorldError>;

    async fn spawn(&self, name: &WorldName) -> Result<SpawnRecord, WorldError>;

    async fn set_spawn(&self, name: &WorldName, spawn: SpawnRecord) -> Result<(), WorldError>;
}
