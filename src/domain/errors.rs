//! Failure taxonomy for world operations
//!
//! Every core operation returns `Result<_, WorldError>` so the I/O phase of an
//! import can report a failure without touching registry state, and the
//! commit phase can decide whether to proceed.

/// Error returned by world life-cycle, import and export operations
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("World not found: {0}")]
    NotFound(String),

    #[error("World already exists: {0}")]
    AlreadyExists(String),

    #[error("World '{name}' {reason}")]
    InvalidState { name: String, reason: String },

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Remote API failure: {0}")]
    RemoteApi(String),

    #[error("Invalid world name: {0:?}")]
    InvalidName(String),

    #[error("Invalid category '{category}'. Available categories: {available}")]
    InvalidCategory { category: String, available: String },

    #[error("Remote repository is not configured")]
    RemoteNotConfigured,

    #[error("World registry is not running")]
    RegistryUnavailable,
}

impl WorldError {
    pub fn invalid_state(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for WorldError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WorldError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Io(format!("background task failed: {}", err))
    }
}
