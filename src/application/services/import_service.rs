//! Import Service - Bring remote maps into the worlds root
//!
//! Every import runs the same pipeline:
//!
//! 1. stage: download into a fresh [`StagingArea`]
//! 2. validate: locate the directory holding the marker file
//! 3. purge: drop per-world identity files that must not be shared
//! 4. commit: hand the content root to the registry
//!
//! The staging area is removed when the operation returns, whatever the
//! outcome, and the world's name lock is held from stage to commit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::WorldRegistryPort;
use crate::application::services::name_locks::NameLocks;
use crate::application::services::remote_fetcher::RemoteContentFetcher;
use crate::domain::errors::WorldError;
use crate::domain::value_objects::{IgnoreList, WorldName};
use crate::infrastructure::archive::{
    find_content_root, unpack_archive, unpack_with, StagingArea, UnpackOptions,
};

/// How a category/map import pulls content from the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Walk the contents API and download file by file
    #[default]
    Tree,
    /// Download one archive and extract the map folder from it
    Archive,
}

/// Import settings taken from configuration
#[derive(Debug, Clone)]
pub struct ImportPolicy {
    pub staging_root: PathBuf,
    pub marker_file: String,
    pub root_search_depth: usize,
    pub ignore: IgnoreList,
    pub purge: Vec<String>,
    pub max_download_bytes: u64,
    pub categories: Vec<String>,
    pub maps_root_folder: String,
    pub strategy: ImportStrategy,
    pub remote_configured: bool,
}

impl ImportPolicy {
    pub fn is_valid_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// A map name must be a single folder inside its category
    pub fn map_folder_name<'a>(&self, map_name: &'a str) -> Result<&'a str, WorldError> {
        let trimmed = map_name.trim();
        let unsafe_name = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
            || trimmed.chars().any(char::is_control);
        if unsafe_name {
            return Err(WorldError::ValidationFailure(format!(
                "map name {:?} is not a single folder name",
                map_name
            )));
        }
        Ok(trimmed)
    }

    /// Repository path of a map, e.g. `maps/CTF/Quintus`
    pub fn folder_path(&self, category: &str, map_name: &str) -> String {
        let root = self.maps_root_folder.trim_matches('/');
        if root.is_empty() {
            format!("{}/{}", category, map_name)
        } else {
            format!("{}/{}/{}", root, category, map_name)
        }
    }
}

/// Result of a committed import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub world: WorldName,
    pub source: String,
    pub files: u64,
}

/// Import use cases
#[async_trait]
pub trait ImportService: Send + Sync {
    /// Import `<category>/<map_name>` from the configured repository
    async fn import_remote(&self, category: &str, map_name: &str)
        -> Result<ImportOutcome, WorldError>;

    /// Import a zipped world from a URL under `world_name`
    async fn import_url(&self, world_name: &str, url: &str) -> Result<ImportOutcome, WorldError>;
}

pub struct ImportServiceImpl {
    registry: Arc<dyn WorldRegistryPort>,
    fetcher: Arc<RemoteContentFetcher>,
    locks: NameLocks,
    policy: ImportPolicy,
}

impl ImportServiceImpl {
    pub fn new(
        registry: Arc<dyn WorldRegistryPort>,
        fetcher: Arc<RemoteContentFetcher>,
        locks: NameLocks,
        policy: ImportPolicy,
    ) -> Self {
        Self {
            registry,
            fetcher,
            locks,
            policy,
        }
    }

    /// Fail before downloading anything if the commit would be refused
    async fn ensure_importable(&self, name: &WorldName) -> Result<(), WorldError> {
        let state = self.registry.state(name).await?;
        if state.is_loaded() {
            return Err(WorldError::invalid_state(
                name.as_str(),
                "is loaded, unload it before importing over it",
            ));
        }
        if state.exists() {
            let dir = self.registry.world_dir(name);
            let mut entries = tokio::fs::read_dir(&dir).await?;
            if entries.next_entry().await?.is_some() {
                return Err(WorldError::AlreadyExists(name.to_string()));
            }
        }
        Ok(())
    }

    fn stage(&self) -> Result<StagingArea, WorldError> {
        Ok(StagingArea::create(&self.policy.staging_root, "import")?)
    }

    async fn unpack_into(
        &self,
        bytes: Vec<u8>,
        dest: &Path,
        options: Option<UnpackOptions>,
    ) -> Result<u64, WorldError> {
        let dest = dest.to_path_buf();
        let ignore = self.policy.ignore.clone();
        let files = tokio::task::spawn_blocking(move || match options {
            Some(options) => unpack_with(&bytes, &dest, &options, |rel| ignore.matches_path(rel)),
            None => unpack_archive(&bytes, &dest, |rel| ignore.matches_path(rel)),
        })
        .await??;
        Ok(files)
    }

    /// Locate the content root inside the staging area and strip identity
    /// files from it
    async fn validate_and_purge(&self, staged: &Path) -> Result<PathBuf, WorldError> {
        let staged = staged.to_path_buf();
        let marker = self.policy.marker_file.clone();
        let depth = self.policy.root_search_depth;
        let purge = self.policy.purge.clone();

        tokio::task::spawn_blocking(move || -> Result<PathBuf, WorldError> {
            let root = find_content_root(&staged, &marker, depth)?.ok_or_else(|| {
                WorldError::ValidationFailure(format!(
                    "no {} found within {} directory levels",
                    marker, depth
                ))
            })?;
            purge_identity_files(&root, &purge)?;
            Ok(root)
        })
        .await?
    }

    async fn commit(
        &self,
        name: &WorldName,
        staging: StagingArea,
        source: String,
        files: u64,
    ) -> Result<ImportOutcome, WorldError> {
        let root = self.validate_and_purge(staging.path()).await?;
        debug!(world = %name, root = %root.display(), "Validated staged content");

        self.registry.import_commit(name, &root).await?;
        drop(staging);

        info!(world = %name, files, "Import committed");
        Ok(ImportOutcome {
            world: name.clone(),
            source,
            files,
        })
    }
}

fn purge_identity_files(root: &Path, purge: &[String]) -> std::io::Result<()> {
    for name in purge {
        let path = root.join(name);
        let Ok(meta) = std::fs::symlink_metadata(&path) else {
            continue;
        };
        if meta.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        debug!(path = %path.display(), "Purged identity file");
    }
    Ok(())
}

#[async_trait]
impl ImportService for ImportServiceImpl {
    #[instrument(skip(self))]
    async fn import_remote(
        &self,
        category: &str,
        map_name: &str,
    ) -> Result<ImportOutcome, WorldError> {
        if !self.policy.remote_configured {
            return Err(WorldError::RemoteNotConfigured);
        }
        if !self.policy.is_valid_category(category) {
            return Err(WorldError::InvalidCategory {
                category: category.to_string(),
                available: self.policy.categories.join(", "),
            });
        }

        let map_folder = self.policy.map_folder_name(map_name)?;
        let name = WorldName::parse(map_folder)?;
        let _guard = self.locks.acquire(&name).await;
        self.ensure_importable(&name).await?;

        let folder = self.policy.folder_path(category, map_folder);
        info!(world = %name, folder = %folder, strategy = ?self.policy.strategy, "Importing map");

        let staging = self.stage()?;
        let files = match self.policy.strategy {
            ImportStrategy::Tree => {
                self.fetcher
                    .fetch_tree(&folder, staging.path(), &self.policy.ignore)
                    .await?
                    .files
            }
            ImportStrategy::Archive => {
                let bytes = self.fetcher.fetch_archive(&folder).await?;
                let options = UnpackOptions::repository_folder(&folder);
                self.unpack_into(bytes, staging.path(), Some(options)).await?
            }
        };

        if files == 0 {
            warn!(world = %name, folder = %folder, "Remote folder produced no files");
        }
        self.commit(&name, staging, folder, files).await
    }

    #[instrument(skip(self))]
    async fn import_url(&self, world_name: &str, url: &str) -> Result<ImportOutcome, WorldError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| WorldError::ValidationFailure(format!("invalid URL {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WorldError::ValidationFailure(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let name = WorldName::parse(world_name)?;
        let _guard = self.locks.acquire(&name).await;
        self.ensure_importable(&name).await?;

        let staging = self.stage()?;
        let bytes = self
            .fetcher
            .fetch_url(parsed.as_str(), Some(self.policy.max_download_bytes))
            .await?;
        if bytes.len() as u64 > self.policy.max_download_bytes {
            return Err(WorldError::ValidationFailure(format!(
                "archive exceeds {} bytes",
                self.policy.max_download_bytes
            )));
        }

        let files = self
            .unpack_into(bytes, staging.path(), None)
            .await?;
        self.commit(&name, staging, parsed.to_string(), files).await
    }
}
