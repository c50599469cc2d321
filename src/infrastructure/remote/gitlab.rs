//! GitLab repository client
//!
//! The project is addressed as `group/project` encoded into one path segment.
//! Tree listings are paginated; pages are followed through `x-next-page`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

use super::http::{ensure_success, join_segments, read_body};
use crate::application::ports::outbound::{RemoteContentPort, RemoteEntry, RemoteError};

const PAGE_SIZE: &str = "100";
const NEXT_PAGE_HEADER: &str = "x-next-page";

#[derive(Debug, Deserialize)]
struct TreeEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Client for `/projects/{group%2Fproject}` on a GitLab v4 API
pub struct GitLabClient {
    client: Client,
    api_url: String,
    project: String,
    token: String,
    branch: String,
}

impl GitLabClient {
    pub fn new(api_url: &str, organization: &str, repository: &str, token: &str, branch: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            project: format!("{}/{}", organization, repository),
            token: token.to_string(),
            branch: branch.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header("PRIVATE-TOKEN", &self.token)
        }
    }

    fn project_url(&self, tail: &[&str]) -> Result<Url, RemoteError> {
        let head = ["projects", self.project.as_str(), "repository"];
        join_segments(&self.api_url, head.iter().chain(tail.iter()).copied())
    }

    async fn list_page(&self, path: &str, page: &str) -> Result<(Vec<TreeEntry>, Option<String>), RemoteError> {
        let mut url = self.project_url(&["tree"])?;
        url.query_pairs_mut()
            .append_pair("path", path)
            .append_pair("ref", &self.branch)
            .append_pair("per_page", PAGE_SIZE)
            .append_pair("page", page);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;
        let next = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let body = response.text().await?;
        let entries: Vec<TreeEntry> = serde_json::from_str(&body)
            .map_err(|e| RemoteError::Decode(format!("tree listing for {}: {}", path, e)))?;
        Ok((entries, next))
    }
}

#[async_trait]
impl RemoteContentPort for GitLabClient {
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let path = path.trim_matches('/');
        let mut entries = Vec::new();
        let mut page = "1".to_string();

        loop {
            let (batch, next) = self.list_page(path, &page).await?;
            entries.extend(batch.into_iter().filter_map(|entry| match entry.kind.as_str() {
                "tree" => Some(RemoteEntry::dir(entry.name, entry.path)),
                "blob" => Some(RemoteEntry::file(entry.name, entry.path)),
                kind => {
                    tracing::debug!(name = %entry.name, kind, "Skipping remote entry");
                    None
                }
            }));
            match next {
                Some(next) if next != page => page = next,
                _ => break,
            }
        }
        Ok(entries)
    }

    async fn fetch_blob(&self, locator: &str) -> Result<Vec<u8>, RemoteError> {
        let mut url = self.project_url(&["files", locator.trim_matches('/'), "raw"])?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;
        read_body(response, None).await
    }

    async fn download_archive(&self, path: &str, git_ref: &str) -> Result<Vec<u8>, RemoteError> {
        let mut url = self.project_url(&["archive.zip"])?;
        url.query_pairs_mut()
            .append_pair("sha", git_ref)
            .append_pair("path", path.trim_matches('/'));

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
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn tree(
        Path(project): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        assert_eq!(project, "acme/maps");
        assert_eq!(headers["private-token"], "secret");
        assert_eq!(query["ref"], "main");
        assert_eq!(query["per_page"], "100");

        match (query["path"].as_str(), query["page"].as_str()) {
            ("CTF/quintus", "1") => (
                [(NEXT_PAGE_HEADER, "2")],
                Json(json!([
                    {"name": "level.dat", "path": "CTF/quintus/level.dat", "type": "blob"},
                    {"name": "sub", "path": "CTF/quintus/sub", "type": "commit"}
                ])),
            )
                .into_response(),
            ("CTF/quintus", "2") => (
                [(NEXT_PAGE_HEADER, "")],
                Json(json!([
                    {"name": "region", "path": "CTF/quintus/region", "type": "tree"}
                ])),
            )
                .into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn raw(
        Path((project, file)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
    ) -> String {
        assert_eq!(project, "acme/maps");
        assert_eq!(query["ref"], "main");
        format!("raw:{}", file)
    }

    async fn archive(Query(query): Query<HashMap<String, String>>) -> String {
        format!("zip:{}:{}", query["sha"], query["path"])
    }

    async fn server() -> String {
        let app = Router::new()
            .route("/api/v4/projects/{project}/repository/tree", get(tree))
            .route("/api/v4/projects/{project}/repository/files/{file}/raw", get(raw))
            .route("/api/v4/projects/{project}/repository/archive.zip", get(archive));
        format!("{}/api/v4", serve(app).await)
    }

    fn client(base: &str) -> GitLabClient {
        GitLabClient::new(base, "acme", "maps", "secret", "main")
    }

    #[tokio::test]
    async fn test_list_directory_follows_pages() {
        let base = server().await;
        let entries = client(&base).list_directory("CTF/quintus").await.unwrap();

        assert_eq!(
            entries,
            vec![
                RemoteEntry::file("level.dat", "CTF/quintus/level.dat"),
                RemoteEntry::dir("region", "CTF/quintus/region"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_blob_encodes_file_path() {
        let base = server().await;
        let bytes = client(&base)
            .fetch_blob("CTF/quintus/level.dat")
            .await
            .unwrap();
        assert_eq!(bytes, b"raw:CTF/quintus/level.dat");
    }

    #[tokio::test]
    async fn test_download_archive_passes_ref_and_path() {
        let base = server().await;
        let bytes = client(&base)
            .download_archive("/CTF/quintus/", "release")
            .await
            .unwrap();
        assert_eq!(bytes, b"zip:release:CTF/quintus");
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let base = server().await;
        let err = client(&base).list_directory("CTF/ghost").await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }
}
