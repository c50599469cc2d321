//! World Lifecycle Service - Create, load, unload and delete build worlds
//!
//! Names arrive as user input and are sanitized here. Each operation holds
//! the world's [`NameLocks`] entry and forwards the state change to the
//! registry, which applies it on its serialized commit path.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::application::ports::outbound::WorldRegistryPort;
use crate::application::services::name_locks::NameLocks;
use crate::domain::entities::{WorldState, WorldSummary};
use crate::domain::errors::WorldError;
use crate::domain::value_objects::{filter_by_prefix, SpawnRecord, WorldName};

/// World lifecycle use cases
#[async_trait]
pub trait WorldLifecycleService: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, WorldError>;

    async fn state(&self, name: &str) -> Result<WorldState, WorldError>;

    /// Generate a new void world and leave it loaded
    async fn create(&self, name: &str) -> Result<WorldName, WorldError>;

    async fn load(&self, name: &str) -> Result<WorldName, WorldError>;

    /// Save and unload; succeeds if the world is already unloaded
    async fn unload(&self, name: &str) -> Result<WorldName, WorldError>;

    /// Remove an unloaded world's directory
    async fn delete(&self, name: &str) -> Result<WorldName, WorldError>;

    async fn list(&self, loaded_only: bool) -> Result<Vec<WorldSummary>, WorldError>;

    /// World names starting with `prefix`, for autocompletion
    async fn suggest_worlds(&self, prefix: &str, loaded_only: bool) -> Vec<String>;

    async fn spawn(&self, name: &str) -> Result<SpawnRecord, WorldError>;

    async fn set_spawn(&self, name: &str, spawn: SpawnRecord) -> Result<WorldName, WorldError>;
}

/// Default implementation backed by the world registry
pub struct WorldLifecycleServiceImpl {
    registry: Arc<dyn WorldRegistryPort>,
    locks: NameLocks,
}

impl WorldLifecycleServiceImpl {
    pub fn new(registry: Arc<dyn WorldRegistryPort>, locks: NameLocks) -> Self {
        Self { registry, locks }
    }
}

#[async_trait]
impl WorldLifecycleService for WorldLifecycleServiceImpl {
    async fn exists(&self, name: &str) -> Result<bool, WorldError> {
        Ok(self.state(name).await?.exists())
    }

    async fn state(&self, name: &str) -> Result<WorldState, WorldError> {
        let name = WorldName::parse(name)?;
        self.registry.state(&name).await
    }

    #[instrument(skip(self))]
    async fn create(&self, name: &str) -> Result<WorldName, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        self.registry.create(&name).await?;
        info!(world = %name, "World created");
        Ok(name)
    }

    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<WorldName, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        self.registry.load(&name).await?;
        info!(world = %name, "World loaded");
        Ok(name)
    }

    #[instrument(skip(self))]
    async fn unload(&self, name: &str) -> Result<WorldName, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        self.registry.unload(&name).await?;
        info!(world = %name, "World unloaded");
        Ok(name)
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<WorldName, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        self.registry.delete(&name).await?;
        info!(world = %name, "World deleted");
        Ok(name)
    }

    async fn list(&self, loaded_only: bool) -> Result<Vec<WorldSummary>, WorldError> {
        self.registry.list(loaded_only).await
    }

    async fn suggest_worlds(&self, prefix: &str, loaded_only: bool) -> Vec<String> {
        match self.registry.list(loaded_only).await {
            Ok(worlds) => filter_by_prefix(worlds.iter().map(|w| w.name.as_str()), prefix),
            Err(e) => {
                debug!(error = %e, "World suggestions unavailable");
                Vec::new()
            }
        }
    }

    async fn spawn(&self, name: &str) -> Result<SpawnRecord, WorldError> {
        let name = WorldName::parse(name)?;
        self.registry.spawn(&name).await
    }

    #[instrument(skip(self, spawn))]
    async fn set_spawn(&self, name: &str, spawn: SpawnRecord) -> Result<WorldName, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        self.registry.set_spawn(&name, spawn).await?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::host::LocalWorldHost;
    use crate::infrastructure::registry::WorldRegistry;
    use crate::infrastructure::storage::SpawnStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn service(root: &Path) -> WorldLifecycleServiceImpl {
        let (handle, _task) = WorldRegistry::new(
            root.to_path_buf(),
            LocalWorldHost::new("level.dat", "session.lock"),
            SpawnStore::new("spawn.json"),
        )
        .start();
        WorldLifecycleServiceImpl::new(Arc::new(handle), NameLocks::new())
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_exists() {
        let temp = TempDir::new().unwrap();
        let service = service(temp.path());

        let name = service.create("My Map's Name!!").await.unwrap();
        assert_eq!(name.as_str(), "my_maps_name");
        assert!(service.exists("my_maps_name").await.unwrap());
        assert!(temp.path().join("my_maps_name").is_dir());

        let err = service.create("my maps name").await.unwrap_err();
        assert!(matches!(err, WorldError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let temp = TempDir::new().unwrap();
        let service = service(temp.path());

        service.create("quintus").await.unwrap();
        assert_eq!(service.state("quintus").await.unwrap(), WorldState::Loaded);

        let err = service.delete("quintus").await.unwrap_err();
        assert!(matches!(err, WorldError::InvalidState { .. }));

        service.unload("quintus").await.unwrap();
        service.unload("quintus").await.unwrap();
        service.delete("quintus").await.unwrap();
        assert!(!service.exists("quintus").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let temp = TempDir::new().unwrap();
        let service = service(temp.path());
        let err = service.create("!!!").await.unwrap_err();
        assert!(matches!(err, WorldError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_suggest_worlds_by_prefix() {
        let temp = TempDir::new().unwrap();
        let service = service(temp.path());
        for raw in ["quintus", "quarry", "alpha"] {
            service.create(raw).await.unwrap();
        }
        service.unload("quarry").await.unwrap();

        assert_eq!(service.suggest_worlds("Q", false).await, vec!["quarry", "quintus"]);
        assert_eq!(service.suggest_worlds("q", true).await, vec!["quintus"]);
        assert_eq!(service.suggest_worlds("", false).await.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_creates_same_name() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(service(temp.path()));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create("race").await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(WorldError::AlreadyExists(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
    }
}
