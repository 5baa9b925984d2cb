//! HTTP request handlers.

/// File and template lookup endpoints.
pub mod file;
/// Metadata instance endpoints.
pub mod metadata;
