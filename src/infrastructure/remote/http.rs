//! Response helpers shared by the remote clients

use futures_util::StreamExt;
use reqwest::{Response, Url};

use crate::application::ports::outbound::RemoteError;

/// Longest error body kept in a `RemoteError::Status`
const MAX_ERROR_BODY: usize = 512;

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}

/// Turn a non-2xx response into `RemoteError::Status`
pub async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(RemoteError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

/// Read a response body, failing as soon as it grows past `max_bytes`
pub async fn read_body(response: Response, max_bytes: Option<u64>) -> Result<Vec<u8>, RemoteError> {
    if let (Some(limit), Some(length)) = (max_bytes, response.content_length()) {
        if length > limit {
            return Err(RemoteError::TooLarge { limit });
        }
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(limit) = max_bytes {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(RemoteError::TooLarge { limit });
            }
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// `base` with extra path segments appended, each percent-encoded on its own
pub fn join_segments<'a, I>(base: &str, segments: I) -> Result<Url, RemoteError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = Url::parse(base).map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| RemoteError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments.into_iter().filter(|s| !s.is_empty()));
    Ok(url)
}

/// Split a slash-separated repository path into its segments
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments_encodes_each_segment() {
        let url = join_segments(
            "https://api.example.com/v4/",
            ["projects", "acme/maps", "repository", "tree"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v4/projects/acme%2Fmaps/repository/tree"
        );

        let url = join_segments("https://api.example.com", path_segments("CTF/Alpha Complex/"))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/CTF/Alpha%20Complex");
    }

    #[test]
    fn test_join_segments_rejects_bad_base() {
        assert!(matches!(
            join_segments("not a url", ["x"]),
            Err(RemoteError::InvalidUrl(_))
        ));
    }
}
