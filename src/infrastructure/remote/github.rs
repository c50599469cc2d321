//! GitHub repository client
//!
//! Listing uses the contents API, one request per directory. Archives come
//! from the zipball endpoint, which always returns the whole repository; the
//! caller filters it down to the folder it wants.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use super::http::{ensure_success, join_segments, path_segments, read_body};
use crate::application::ports::outbound::{RemoteContentPort, RemoteEntry, RemoteError};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "WorldVault";

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// Client for `/repos/{owner}/{repo}` on a GitHub-compatible API
pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repository: String,
    token: String,
    branch: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, owner: &str, repository: &str, token: &str, branch: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
            branch: branch.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT);
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    fn repo_url<'a>(&'a self, tail: impl IntoIterator<Item = &'a str>) -> Result<reqwest::Url, RemoteError> {
        let head = ["repos", self.owner.as_str(), self.repository.as_str()];
        join_segments(&self.api_url, head.into_iter().chain(tail))
    }
}

#[async_trait]
impl RemoteContentPort for GitHubClient {
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let mut url = self.repo_url(std::iter::once("contents").chain(path_segments(path)))?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;

        let entries: Vec<ContentEntry> = serde_json::from_str(&body).map_err(|e| {
            RemoteError::Decode(format!("{} is not a directory listing: {}", path, e))
        })?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| match (entry.kind.as_str(), entry.download_url) {
                ("dir", _) => Some(RemoteEntry::dir(entry.name, entry.path)),
                ("file", Some(download_url)) => Some(RemoteEntry::file(entry.name, download_url)),
                (kind, _) => {
                    tracing::debug!(name = %entry.name, kind, "Skipping remote entry");
                    None
                }
            })
            .collect())
    }

    async fn fetch_blob(&self, locator: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.authorized(self.client.get(locator)).send().await?;
        let response = ensure_success(response).await?;
        read_body(response, None).await
    }

    async fn download_archive(&self, _path: &str, git_ref: &str) -> Result<Vec<u8>, RemoteError> {
        let url = self.repo_url(["zipball", git_ref])?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;
        read_body(response, None).await
    }

    fn default_ref(&self) -> String {
        self.branch.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::test_server::serve;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn contents(
        Path((owner, repo, path)): Path<(String, String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        assert_eq!(owner, "acme");
        assert_eq!(repo, "maps");
        assert_eq!(query.get("ref").map(String::as_str), Some("main"));
        assert_eq!(headers["authorization"], "Bearer secret");
        assert_eq!(headers["x-github-api-version"], API_VERSION);

        let base = headers["host"].to_str().unwrap().to_string();
        match path.as_str() {
            "CTF/Alpha Complex" => Ok(Json(json!([
                {"name": "level.dat", "path": "CTF/Alpha Complex/level.dat", "type": "file",
                 "download_url": format!("http://{}/raw/level.dat", base)},
                {"name": "region", "path": "CTF/Alpha Complex/region", "type": "dir",
                 "download_url": null},
                {"name": "link", "path": "CTF/Alpha Complex/link", "type": "symlink",
                 "download_url": null}
            ]))),
            "CTF/single.txt" => Ok(Json(json!({"name": "single.txt", "type": "file"}))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn server() -> String {
        let app = Router::new()
            .route("/repos/{owner}/{repo}/contents/{*path}", get(contents))
            .route("/raw/level.dat", get(|| async { "level-bytes" }))
            .route(
                "/repos/{owner}/{repo}/zipball/{git_ref}",
                get(|Path((_, _, git_ref)): Path<(String, String, String)>| async move {
                    format!("zip@{}", git_ref)
                }),
            );
        serve(app).await
    }

    fn client(base: &str) -> GitHubClient {
        GitHubClient::new(base, "acme", "maps", "secret", "main")
    }

    #[tokio::test]
    async fn test_list_directory_maps_entries() {
        let base = server().await;
        let entries = client(&base)
            .list_directory("CTF/Alpha Complex")
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "level.dat");
        assert!(!entries[0].is_dir());
        assert!(entries[0].locator.ends_with("/raw/level.dat"));
        assert_eq!(entries[1], RemoteEntry::dir("region", "CTF/Alpha Complex/region"));
    }

    #[tokio::test]
    async fn test_fetch_blob_and_archive() {
        let base = server().await;
        let client = client(&base);

        let blob = client
            .fetch_blob(&format!("{}/raw/level.dat", base))
            .await
            .unwrap();
        assert_eq!(blob, b"level-bytes");

        let archive = client.download_archive("CTF/x", "main").await.unwrap();
        assert_eq!(archive, b"zip@main");
        assert_eq!(client.default_ref(), "main");
    }

    #[tokio::test]
    async fn test_missing_path_and_file_path() {
        let base = server().await;
        let client = client(&base);

        let err = client.list_directory("CTF/ghost").await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));

        let err = client.list_directory("CTF/single.txt").await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }
}
