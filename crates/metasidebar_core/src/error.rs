//! Error types for metadata API operations.
use thiserror::Error;

/// Failure reported by a [`crate::MetadataApi`] implementation.
///
/// The sidebar collapses every variant into a single error state; the
/// variants exist so transports can map them to and from status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Patch failed: {0}")]
    PatchFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Internal server error")]
    Internal,
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
