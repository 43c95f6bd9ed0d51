//! Error types for the BSUB.IO transport layer.
//!
//! [`ServiceError`] covers everything a single remote call can go wrong with:
//! the network, a non-success status, or a body that does not match the
//! service contract.

use thiserror::Error;

/// Errors returned by a [`JobService`](super::JobService) call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Underlying network failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a status other than the expected success code.
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// The body did not have the expected shape (missing `data`, bad JSON).
    #[error("unexpected response format: {0}")]
    Malformed(String),

    /// The client could not be built from the supplied configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Reading the local payload failed before it could be sent.
    #[error("failed to read payload: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn unexpected_status(status: u16, message: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { status: 404, .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
