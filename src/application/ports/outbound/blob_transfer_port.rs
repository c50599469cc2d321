//! Blob transfer port - Plain GET/PUT of opaque blobs by URL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RemoteError;

/// Expiry hints sent along with an uploaded blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareHints {
    pub max_downloads: u32,
    pub max_days: u32,
}

impl Default for ShareHints {
    fn default() -> Self {
        Self {
            max_downloads: 1,
            max_days: 14,
        }
    }
}

/// Link to an uploaded blob
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedLink {
    pub url: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub expires_at: DateTime<Utc>,
    pub max_downloads: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobTransferPort: Send + Sync {
    /// Download a blob, failing once it grows past `max_bytes`
    async fn download(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, RemoteError>;

    /// Upload a blob and return where it can be fetched from
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        hints: ShareHints,
    ) -> Result<SharedLink, RemoteError>;
}
