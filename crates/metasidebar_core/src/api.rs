//! Capability interface to the metadata service.

use crate::error::ApiError;
use crate::models::{EditorSet, FileRecord, ListOptions, MetadataEditor, MetadataTemplate};
use crate::patch::PatchOp;

/// The four operations the sidebar issues against a metadata service.
///
/// Each call blocks until the service answers and reports its outcome as a
/// single `Result`. Implementations are driven from the sidebar's backend
/// worker thread, hence the `Send` bound.
pub trait MetadataApi: Send {
    /// Fetch the editors attached to `file` and the templates that may be attached.
    fn get_editors(&self, file: &FileRecord, options: &ListOptions) -> Result<EditorSet, ApiError>;

    /// Attach a new, empty instance of `template` to `file`.
    fn create_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
    ) -> Result<MetadataEditor, ApiError>;

    /// Apply `ops` to the instance of `template` attached to `file`.
    fn update_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
        ops: &[PatchOp],
    ) -> Result<MetadataEditor, ApiError>;

    /// Detach the instance of `template` from `file`.
    fn delete_metadata(&self, file: &FileRecord, template: &MetadataTemplate)
        -> Result<(), ApiError>;
}
