//! Remote adapters - Repository APIs and plain URL transfers

mod direct;
mod github;
mod gitlab;
mod http;

use std::sync::Arc;

pub use direct::DirectUrlClient;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;

use crate::application::ports::outbound::RemoteContentPort;
use crate::infrastructure::config::{RemoteConfig, RemoteProvider};

/// Build the repository client selected by configuration
pub fn content_client(config: &RemoteConfig) -> Arc<dyn RemoteContentPort> {
    let api_url = config.effective_api_url();
    match config.provider {
        RemoteProvider::GitHub => Arc::new(GitHubClient::new(
            &api_url,
            &config.organization,
            &config.repository,
            &config.token,
            &config.default_branch,
        )),
        RemoteProvider::GitLab => Arc::new(GitLabClient::new(
            &api_url,
            &config.organization,
            &config.repository,
            &config.token,
            &config.default_branch,
        )),
    }
}
