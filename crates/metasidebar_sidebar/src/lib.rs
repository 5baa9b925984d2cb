//! Metadata sidebar controller, its backend worker, and the HTTP client.

/// Command/event protocol and the background worker.
pub mod backend;
/// Blocking HTTP implementation of the metadata API.
pub mod http;
mod sidebar;

pub use backend::{spawn_backend, BackendHandle, CoreCmd, CoreEvent, RequestId, SidebarOp};
pub use http::HttpMetadataApi;
pub use sidebar::{MetadataSidebar, SidebarOptions};
