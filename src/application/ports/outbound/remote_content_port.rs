//! Remote content port - Read-only access to a map repository
//!
//! Two repository APIs sit behind this port: a contents API that lists one
//! directory per request, and an archive API that returns a whole subtree as
//! a zip. Authentication, API base and branch are adapter configuration.

use async_trait::async_trait;

use crate::domain::errors::WorldError;

/// Kind of an entry in a remote directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEntryKind {
    File,
    Dir,
}

/// One entry of a remote directory listing.
///
/// For directories `locator` is the repository path to list next; for files
/// it is whatever [`RemoteContentPort::fetch_blob`] needs to download it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteEntryKind,
    pub locator: String,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RemoteEntryKind::File,
            locator: locator.into(),
        }
    }

    pub fn dir(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RemoteEntryKind::Dir,
            locator: locator.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == RemoteEntryKind::Dir
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Remote returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Unexpected remote response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Download exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RemoteError> for WorldError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Transport(_) | RemoteError::Io(_) => WorldError::Io(err.to_string()),
            RemoteError::Status { status: 404, .. } => WorldError::NotFound(err.to_string()),
            RemoteError::Status { .. } | RemoteError::Decode(_) => {
                WorldError::RemoteApi(err.to_string())
            }
            RemoteError::InvalidUrl(_) | RemoteError::TooLarge { .. } => {
                WorldError::ValidationFailure(err.to_string())
            }
        }
    }
}

/// Capability interface over a map repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteContentPort: Send + Sync {
    /// List the entries of a repository directory
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Download one file given the locator from its listing entry
    async fn fetch_blob(&self, locator: &str) -> Result<Vec<u8>, RemoteError>;

    /// Download an archive that contains `path` at `git_ref`.
    ///
    /// Entries are wrapped in a single archive root directory, and some
    /// providers return the whole repository regardless of `path`.
    async fn download_archive(&self, path: &str, git_ref: &str) -> Result<Vec<u8>, RemoteError>;

    /// Branch or tag used when the caller does not name one
    fn default_ref(&self) -> String;
}
