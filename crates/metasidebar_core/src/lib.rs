//! Core domain library for the metadata sidebar (models, store, view, api).

/// Metadata API capability trait.
pub mod api;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Error types returned by metadata API implementations.
pub mod error;
/// In-memory metadata service used by the server and tests.
pub mod memory;
/// Data models shared by every crate.
pub mod models;
/// JSON-patch-like field mutation.
pub mod patch;
/// Editor list state and its transitions.
pub mod store;
/// Derived view model for the sidebar.
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::MetadataApi;
pub use config::Config;
pub use constants::*;
pub use error::ApiError;
pub use memory::MemoryMetadataApi;
pub use store::EditorListState;
pub use view::{project, SidebarView};
