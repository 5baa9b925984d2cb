//! Data models shared by the API, store, and view layers.

/// Metadata instances, editors, and list responses.
pub mod editor;
/// Subject file records.
pub mod file;
/// Metadata template schemas.
pub mod template;

pub use editor::{EditorSet, ListOptions, MetadataEditor, MetadataInstance};
pub use file::{FilePermissions, FileRecord};
pub use template::{FieldType, MetadataTemplate, TemplateField};
