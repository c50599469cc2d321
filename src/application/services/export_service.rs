//! Export Service - Package a world and publish a download link

use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, instrument};

use crate::application::ports::outbound::{
    BlobTransferPort, ShareHints, SharedLink, WorldRegistryPort,
};
use crate::application::services::name_locks::NameLocks;
use crate::domain::errors::WorldError;
use crate::domain::value_objects::{IgnoreList, WorldName};
use crate::infrastructure::archive::pack_directory;

const SHARE_SUFFIX_LEN: usize = 6;

/// Export settings taken from configuration
#[derive(Debug, Clone)]
pub struct ExportPolicy {
    pub lock_file: String,
    pub ignore: IgnoreList,
    pub hints: ShareHints,
}

#[async_trait]
pub trait ExportService: Send + Sync {
    /// Zip a world directory, upload it and return the download link
    async fn export(&self, name: &str) -> Result<SharedLink, WorldError>;
}

pub struct ExportServiceImpl {
    registry: Arc<dyn WorldRegistryPort>,
    blobs: Arc<dyn BlobTransferPort>,
    locks: NameLocks,
    policy: ExportPolicy,
}

impl ExportServiceImpl {
    pub fn new(
        registry: Arc<dyn WorldRegistryPort>,
        blobs: Arc<dyn BlobTransferPort>,
        locks: NameLocks,
        policy: ExportPolicy,
    ) -> Self {
        Self {
            registry,
            blobs,
            locks,
            policy,
        }
    }

    fn share_file_name(name: &WorldName) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SHARE_SUFFIX_LEN)
            .map(char::from)
            .collect();
        format!("{}-{}.zip", name, suffix)
    }
}

#[async_trait]
impl ExportService for ExportServiceImpl {
    #[instrument(skip(self))]
    async fn export(&self, name: &str) -> Result<SharedLink, WorldError> {
        let name = WorldName::parse(name)?;
        let _guard = self.locks.acquire(&name).await;

        let state = self.registry.state(&name).await?;
        if !state.exists() {
            return Err(WorldError::NotFound(name.to_string()));
        }
        if state.is_loaded() {
            self.registry.save(&name).await?;
        }

        let dir = self.registry.world_dir(&name);
        let ignore = self.policy.ignore.clone().with(&self.policy.lock_file);
        let bytes = tokio::task::spawn_blocking(move || {
            pack_directory(&dir, |rel| ignore.matches_path(rel))
        })
        .await??;

        let file_name = Self::share_file_name(&name);
        info!(world = %name, file = %file_name, bytes = bytes.len(), "Uploading world archive");
        let link = self.blobs.upload(&file_name, bytes, self.policy.hints).await?;

        info!(world = %name, url = %link.url, expires_at = %link.expires_at, "World exported");
        Ok(link)
    }
}
