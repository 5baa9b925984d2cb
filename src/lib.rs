//! Root crate facade for the metadata sidebar workspace.

pub use metasidebar_core::{
    api, config, memory, models, patch, project, store, view, ApiError, Config, EditorListState,
    MemoryMetadataApi, MetadataApi, SidebarView, DEFAULT_PORT,
};
pub use metasidebar_server::{
    create_app, resolve_bind_address, serve_router, AppState, EmbeddedServer,
};
pub use metasidebar_sidebar::{HttpMetadataApi, MetadataSidebar, SidebarOptions};

use metasidebar_core::memory::{SeedData, SeedError};

/// Build the in-memory metadata service for `config`.
///
/// Loads `config.seed_path` when set, otherwise the built-in demo data.
///
/// # Errors
/// Returns [`SeedError`] when the seed file cannot be read or parsed.
pub fn load_service(config: &Config) -> Result<MemoryMetadataApi, SeedError> {
    match config.seed_path.as_deref() {
        Some(path) => MemoryMetadataApi::load_seed(path),
        None => {
            tracing::info!("No METASIDEBAR_SEED set; using demo data");
            Ok(MemoryMetadataApi::from_seed(SeedData::demo()))
        }
    }
}
