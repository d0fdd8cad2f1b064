//! Backend errors

use thiserror::Error;

/// Result alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors crossing the managed-backend boundary
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connection, TLS, timeout)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// Credential check failed
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No row matched the request
    #[error("record not found")]
    NotFound,

    /// Conditional claim lost: the code was already consumed
    #[error("code already used")]
    CodeTaken,

    /// Malformed response payload
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session persistence failure
    #[error("session storage error: {0}")]
    SessionStorage(#[from] std::io::Error),
}

impl BackendError {
    /// Whether this error is the invalid-credentials rejection
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}
