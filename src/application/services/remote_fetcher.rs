//! Remote Content Fetcher - Materialize remote map content locally
//!
//! Stateless over calls: repository location, credentials and branch live in
//! the [`RemoteContentPort`] adapter. No retries; the first failure wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ports::outbound::{BlobTransferPort, RemoteContentPort, RemoteEntry};
use crate::domain::errors::WorldError;
use crate::domain::value_objects::IgnoreList;

/// What a tree download produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub files: u64,
    pub directories: u64,
    pub skipped: u64,
    pub bytes: u64,
}

pub struct RemoteContentFetcher {
    remote: Arc<dyn RemoteContentPort>,
    blobs: Arc<dyn BlobTransferPort>,
}

impl RemoteContentFetcher {
    pub fn new(remote: Arc<dyn RemoteContentPort>, blobs: Arc<dyn BlobTransferPort>) -> Self {
        Self { remote, blobs }
    }

    /// Download the remote directory `path` into `dest`, recreating its
    /// layout. Directories are walked with an explicit stack, so depth is
    /// bounded only by the remote tree itself.
    #[instrument(skip(self, dest, ignore), fields(dest = %dest.display()))]
    pub async fn fetch_tree(
        &self,
        path: &str,
        dest: &Path,
        ignore: &IgnoreList,
    ) -> Result<FetchSummary, WorldError> {
        let mut summary = FetchSummary::default();
        let mut pending: Vec<(String, PathBuf)> = vec![(path.to_string(), dest.to_path_buf())];

        while let Some((locator, local_dir)) = pending.pop() {
            tokio::fs::create_dir_all(&local_dir).await?;
            let entries = self.remote.list_directory(&locator).await?;
            debug!(locator = %locator, entries = entries.len(), "Listed remote directory");

            for entry in entries {
                check_entry_name(&entry)?;
                if ignore.matches_name(&entry.name) {
                    summary.skipped += 1;
                    continue;
                }

                let local_path = local_dir.join(&entry.name);
                if entry.is_dir() {
                    summary.directories += 1;
                    pending.push((entry.locator, local_path));
                } else {
                    let bytes = self.remote.fetch_blob(&entry.locator).await?;
                    summary.bytes += bytes.len() as u64;
                    tokio::fs::write(&local_path, &bytes).await?;
                    summary.files += 1;
                }
            }
        }

        info!(
            files = summary.files,
            directories = summary.directories,
            skipped = summary.skipped,
            "Fetched remote tree"
        );
        Ok(summary)
    }

    /// Download the repository archive that contains `path` on the default
    /// branch
    #[instrument(skip(self))]
    pub async fn fetch_archive(&self, path: &str) -> Result<Vec<u8>, WorldError> {
        let git_ref = self.remote.default_ref();
        let bytes = self.remote.download_archive(path, &git_ref).await?;
        info!(bytes = bytes.len(), git_ref = %git_ref, "Downloaded repository archive");
        Ok(bytes)
    }

    /// Download an archive from an arbitrary URL
    #[instrument(skip(self))]
    pub async fn fetch_url(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, WorldError> {
        let bytes = self.blobs.download(url, max_bytes).await?;
        info!(bytes = bytes.len(), "Downloaded archive");
        Ok(bytes)
    }
}

fn check_entry_name(entry: &RemoteEntry) -> Result<(), WorldError> {
    let name = entry.name.as_str();
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains(':');
    if unsafe_name {
        return Err(WorldError::ValidationFailure(format!(
            "remote entry has an unsafe name: {:?}",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{
        MockBlobTransferPort, MockRemoteContentPort, RemoteError,
    };
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn fetcher(remote: MockRemoteContentPort) -> RemoteContentFetcher {
        RemoteContentFetcher::new(Arc::new(remote), Arc::new(MockBlobTransferPort::new()))
    }

    #[tokio::test]
    async fn test_fetch_tree_recreates_layout_and_skips_ignored() {
        let mut remote = MockRemoteContentPort::new();
        remote
            .expect_list_directory()
            .with(eq("CTF/quintus"))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    RemoteEntry::file("level.dat", "blob/level"),
                    RemoteEntry::file("map.xml", "blob/xml"),
                    RemoteEntry::dir("region", "CTF/quintus/region"),
                    RemoteEntry::dir(".git", "CTF/quintus/.git"),
                ])
            });
        remote
            .expect_list_directory()
            .with(eq("CTF/quintus/region"))
            .times(1)
            .returning(|_| Ok(vec![RemoteEntry::file("r.0.0.mca", "blob/region")]));
        remote
            .expect_fetch_blob()
            .times(2)
            .returning(|locator| Ok(locator.as_bytes().to_vec()));

        let temp = TempDir::new().unwrap();
        let ignore = IgnoreList::new([".git", "map.xml"]);
        let summary = fetcher(remote)
            .fetch_tree("CTF/quintus", temp.path(), &ignore)
            .await
            .unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.directories, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(std::fs::read(temp.path().join("level.dat")).unwrap(), b"blob/level");
        assert_eq!(
            std::fs::read(temp.path().join("region/r.0.0.mca")).unwrap(),
            b"blob/region"
        );
        assert!(!temp.path().join("map.xml").exists());
    }

    #[tokio::test]
    async fn test_fetch_tree_surfaces_remote_failure() {
        let mut remote = MockRemoteContentPort::new();
        remote.expect_list_directory().returning(|path| {
            Err(RemoteError::Status {
                status: 404,
                url: path.to_string(),
                body: String::new(),
            })
        });

        let temp = TempDir::new().unwrap();
        let err = fetcher(remote)
            .fetch_tree("CTF/missing", temp.path(), &IgnoreList::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorldError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_tree_rejects_unsafe_names() {
        let mut remote = MockRemoteContentPort::new();
        remote
            .expect_list_directory()
            .returning(|_| Ok(vec![RemoteEntry::file("..", "blob/evil")]));
        remote.expect_fetch_blob().never();

        let temp = TempDir::new().unwrap();
        let err = fetcher(remote)
            .fetch_tree("CTF/quintus", &temp.path().join("dest"), &IgnoreList::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorldError::ValidationFailure(_)));
    }

    #[tokio::test]
    async fn test_fetch_archive_uses_default_ref() {
        let mut remote = MockRemoteContentPort::new();
        remote
            .expect_default_ref()
            .returning(|| "main".to_string());
        remote
            .expect_download_archive()
            .with(eq("CTF/quintus"), eq("main"))
            .times(1)
            .returning(|_, _| Ok(vec![1, 2, 3]));

        let bytes = fetcher(remote).fetch_archive("CTF/quintus").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_url_passes_size_limit() {
        let mut blobs = MockBlobTransferPort::new();
        blobs
            .expect_download()
            .with(eq("https://example.com/map.zip"), eq(Some(10u64)))
            .times(1)
            .returning(|_, limit| Err(RemoteError::TooLarge { limit: limit.unwrap_or(0) }));

        let fetcher =
            RemoteContentFetcher::new(Arc::new(MockRemoteContentPort::new()), Arc::new(blobs));
        let err = fetcher
            .fetch_url("https://example.com/map.zip", Some(10))
            .await
            .unwrap_err();
        assert!(matches!(err, WorldError::ValidationFailure(_)));
    }
}
