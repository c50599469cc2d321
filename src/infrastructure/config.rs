//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `worldvault.toml`, then `WORLDVAULT__SECTION__KEY` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::ShareHints;
use crate::application::services::{
    ExportPolicy, ImportPolicy, ImportStrategy, DEFAULT_SUGGESTION_TTL,
};
use crate::domain::value_objects::IgnoreList;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "worldvault.toml";

const ENV_PREFIX: &str = "WORLDVAULT";
const ENV_SEPARATOR: &str = "__";
const LIST_KEYS: [&str; 3] = [
    "remote.categories",
    "upload.ignored_files",
    "upload.purge_on_import",
];

const GITHUB_API_URL: &str = "https://api.github.com";
const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub upload: UploadConfig,
    pub share: ShareConfig,
    pub suggestions: SuggestionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP admin API port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per world
    pub worlds_root: PathBuf,
    /// Scratch space for imports
    pub staging_root: PathBuf,
    /// File that marks a directory as a world
    pub marker_file: String,
    /// Spawn sidecar written next to the marker
    pub spawn_file: String,
    /// Lock file present while a world is loaded
    pub lock_file: String,
    /// How deep below an unpacked archive the marker may sit
    pub root_search_depth: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            worlds_root: PathBuf::from("worldvault_worlds"),
            staging_root: PathBuf::from("worldvault_staging"),
            marker_file: "level.dat".to_string(),
            spawn_file: "spawn.json".to_string(),
            lock_file: "session.lock".to_string(),
            root_search_depth: 3,
        }
    }
}

/// Repository API behind category/map imports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteProvider {
    #[default]
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub provider: RemoteProvider,
    /// API base; empty selects the provider's public endpoint
    pub api_url: String,
    pub token: String,
    pub organization: String,
    pub repository: String,
    pub default_branch: String,
    /// Folder holding the category folders, empty for the repository root
    pub maps_root_folder: String,
    pub categories: Vec<String>,
    pub import_strategy: ImportStrategy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            provider: RemoteProvider::default(),
            api_url: String::new(),
            token: String::new(),
            organization: String::new(),
            repository: String::new(),
            default_branch: "main".to_string(),
            maps_root_folder: String::new(),
            categories: [
                "Arcade", "CTF", "CTW", "DTC", "DTM", "KOTH", "Mixed", "Nexus", "SkyWars", "TDM",
                "Walls",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            import_strategy: ImportStrategy::default(),
        }
    }
}

impl RemoteConfig {
    pub fn has_remote_defaults(&self) -> bool {
        !self.organization.trim().is_empty() && !self.repository.trim().is_empty()
    }

    pub fn is_remote_configured(&self) -> bool {
        !self.token.trim().is_empty()
    }

    pub fn effective_api_url(&self) -> String {
        if !self.api_url.trim().is_empty() {
            return self.api_url.trim().to_string();
        }
        match self.provider {
            RemoteProvider::GitHub => GITHUB_API_URL.to_string(),
            RemoteProvider::GitLab => GITLAB_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest archive accepted by URL imports
    pub max_size_mb: u64,
    pub ignored_files: Vec<String>,
    /// Identity files removed from imported worlds
    pub purge_on_import: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 500,
            ignored_files: [
                ".git",
                ".gitignore",
                "README.md",
                "session.lock",
                "map.xml",
                "map.yml",
                "map.png",
                "map_banner.png",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            purge_on_import: ["uid.dat", "spawn.json", "data"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Transfer-style endpoint accepting `PUT {upload_url}/{file}`
    pub upload_url: String,
    pub max_downloads: u32,
    pub max_days: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        let hints = ShareHints::default();
        Self {
            upload_url: String::new(),
            max_downloads: hints.max_downloads,
            max_days: hints.max_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub ttl_ms: u64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_SUGGESTION_TTL.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Load from `worldvault.toml` (if present) and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), None)
    }

    /// Load from `file` (optional) and either the process environment or
    /// the given variables
    pub fn load_from(file: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .source(env);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let settings = config::Config::builder()
            .add_source(
                config::Config::try_from(&AppConfig::default())
                    .context("Failed to serialize default configuration")?,
            )
            .add_source(config::File::from(file).required(false))
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn share_hints(&self) -> ShareHints {
        ShareHints {
            max_downloads: self.share.max_downloads,
            max_days: self.share.max_days,
        }
    }

    pub fn suggestion_ttl(&self) -> Duration {
        Duration::from_millis(self.suggestions.ttl_ms)
    }

    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::new(&self.upload.ignored_files)
    }

    pub fn max_download_bytes(&self) -> u64 {
        self.upload.max_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn import_policy(&self) -> ImportPolicy {
        ImportPolicy {
            staging_root: self.storage.staging_root.clone(),
            marker_file: self.storage.marker_file.clone(),
            root_search_depth: self.storage.root_search_depth,
            ignore: self.ignore_list(),
            purge: self.upload.purge_on_import.clone(),
            max_download_bytes: self.max_download_bytes(),
            categories: self.remote.categories.clone(),
            maps_root_folder: self.remote.maps_root_folder.clone(),
            strategy: self.remote.import_strategy,
            remote_configured: self.remote.is_remote_configured()
                && self.remote.has_remote_defaults(),
        }
    }

    pub fn export_policy(&self) -> ExportPolicy {
        ExportPolicy {
            lock_file: self.storage.lock_file.clone(),
            ignore: self.ignore_list(),
            hints: self.share_hints(),
        }
    }
}
