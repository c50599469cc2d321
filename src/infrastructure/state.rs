//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use crate::application::ports::outbound::{BlobTransferPort, RemoteContentPort};
use crate::application::services::{
    ExportService, ExportServiceImpl, ImportService, ImportServiceImpl, MapSuggestionService,
    NameLocks, RemoteContentFetcher, WorldLifecycleService, WorldLifecycleServiceImpl,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::host::LocalWorldHost;
use crate::infrastructure::registry::{RegistryHandle, WorldRegistry};
use crate::infrastructure::remote::{content_client, DirectUrlClient};
use crate::infrastructure::storage::SpawnStore;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    /// Client for the registry thread, used for shutdown
    pub registry: RegistryHandle,
    // Application services
    pub worlds: Arc<dyn WorldLifecycleService>,
    pub imports: Arc<dyn ImportService>,
    pub exports: Arc<dyn ExportService>,
    pub suggestions: Arc<MapSuggestionService>,
}

impl AppState {
    /// Build the state with the configured remote clients and start the
    /// world registry. The returned task ends after [`RegistryHandle::shutdown`].
    pub async fn new(config: AppConfig) -> Result<(Self, JoinHandle<()>)> {
        let remote = content_client(&config.remote);
        let share_url = Some(config.share.upload_url.clone());
        let blobs: Arc<dyn BlobTransferPort> = Arc::new(DirectUrlClient::new(share_url));
        Self::with_clients(config, remote, blobs).await
    }

    pub async fn with_clients(
        config: AppConfig,
        remote: Arc<dyn RemoteContentPort>,
        blobs: Arc<dyn BlobTransferPort>,
    ) -> Result<(Self, JoinHandle<()>)> {
        let storage = &config.storage;
        for dir in [&storage.worlds_root, &storage.staging_root] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        // Initialize the registry thread
        let host = LocalWorldHost::new(&storage.marker_file, &storage.lock_file);
        let (registry, registry_task) = WorldRegistry::new(
            storage.worlds_root.clone(),
            host,
            SpawnStore::new(&storage.spawn_file),
        )
        .start();

        // Initialize application services
        let locks = NameLocks::new();
        let fetcher = Arc::new(RemoteContentFetcher::new(remote.clone(), blobs.clone()));
        let worlds = Arc::new(WorldLifecycleServiceImpl::new(
            Arc::new(registry.clone()),
            locks.clone(),
        ));
        let imports = Arc::new(ImportServiceImpl::new(
            Arc::new(registry.clone()),
            fetcher,
            locks.clone(),
            config.import_policy(),
        ));
        let exports = Arc::new(ExportServiceImpl::new(
            Arc::new(registry.clone()),
            blobs,
            locks,
            config.export_policy(),
        ));
        let suggestions = Arc::new(MapSuggestionService::new(
            remote,
            config.remote.maps_root_folder.clone(),
            config.suggestion_ttl(),
        ));

        let state = Self {
            config,
            registry,
            worlds,
            imports,
            exports,
            suggestions,
        };
        Ok((state, registry_task))
    }
}
