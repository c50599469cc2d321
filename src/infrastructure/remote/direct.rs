//! Plain URL transfers: archive downloads and transfer-style share uploads

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;

use super::http::{ensure_success, join_segments, read_body};
use crate::application::ports::outbound::{BlobTransferPort, RemoteError, ShareHints, SharedLink};

/// Client for arbitrary URLs, without provider headers.
///
/// Uploads go to `PUT {upload_url}/{file_name}`; the service answers with the
/// public link as plain text.
pub struct DirectUrlClient {
    client: Client,
    upload_url: Option<String>,
}

impl DirectUrlClient {
    pub fn new(upload_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            upload_url: upload_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }
}

#[async_trait]
impl BlobTransferPort for DirectUrlClient {
    async fn download(&self, url: &str, max_bytes: Option<u64>) -> Result<Vec<u8>, RemoteError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", url, e)))?;
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        read_body(response, max_bytes).await
    }

    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        hints: ShareHints,
    ) -> Result<SharedLink, RemoteError> {
        let base = self
            .upload_url
            .as_deref()
            .ok_or_else(|| RemoteError::InvalidUrl("no share upload URL configured".to_string()))?;
        let url = join_segments(base, [file_name])?;
        let size_bytes = bytes.len() as u64;

        let response = self
            .client
            .put(url.clone())
            .header("Max-Downloads", hints.max_downloads.to_string())
            .header("Max-Days", hints.max_days.to_string())
            .body(bytes)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;

        let link = body.trim();
        let url = if link.is_empty() {
            url.to_string()
        } else {
            link.to_string()
        };
        tracing::debug!(url = %url, size_bytes, "Blob uploaded");

        Ok(SharedLink {
            url,
            file_name: file_name.to_string(),
            size_bytes,
            expires_at: Utc::now() + Duration::days(i64::from(hints.max_days)),
            max_downloads: hints.max_downloads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::test_server::serve;
    use axum::body::Bytes;
    use axum::extract::Path;
    use axum::http::HeaderMap;
    use axum::routing::{get, put};
    use axum::Router;

    async fn server() -> String {
        let app = Router::new()
            .route("/maps/small.zip", get(|| async { vec![7u8; 16] }))
            .route("/maps/big.zip", get(|| async { vec![7u8; 4096] }))
            .route(
                "/share/{file}",
                put(|Path(file): Path<String>, headers: HeaderMap, body: Bytes| async move {
                    assert_eq!(headers["max-downloads"], "1");
                    assert_eq!(headers["max-days"], "14");
                    format!("https://dl.example.com/{}/{}\n", body.len(), file)
                }),
            );
        serve(app).await
    }

    #[tokio::test]
    async fn test_download_with_limit() {
        let base = server().await;
        let client = DirectUrlClient::new(None);

        let bytes = client
            .download(&format!("{}/maps/small.zip", base), Some(1024))
            .await
            .unwrap();
        assert_eq!(bytes.len(), 16);

        let err = client
            .download(&format!("{}/maps/big.zip", base), Some(1024))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::TooLarge { limit: 1024 }));

        let err = client
            .download(&format!("{}/maps/none.zip", base), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_upload_returns_link_and_expiry() {
        let base = server().await;
        let client = DirectUrlClient::new(Some(format!("{}/share/", base)));

        let before = Utc::now();
        let link = client
            .upload("quintus-AbC123.zip", vec![1, 2, 3], ShareHints::default())
            .await
            .unwrap();

        assert_eq!(link.url, "https://dl.example.com/3/quintus-AbC123.zip");
        assert_eq!(link.file_name, "quintus-AbC123.zip");
        assert_eq!(link.size_bytes, 3);
        assert_eq!(link.max_downloads, 1);
        assert!(link.expires_at >= before + Duration::days(14));
    }

    #[tokio::test]
    async fn test_upload_without_endpoint() {
        let client = DirectUrlClient::new(Some(String::new()));
        let err = client
            .upload("x.zip", Vec::new(), ShareHints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl(_)));
    }
}
