//! Protocol types for the sidebar backend worker.

use metasidebar_core::models::{FileRecord, ListOptions, MetadataEditor, MetadataTemplate};
use metasidebar_core::patch::PatchOp;
use std::fmt;

/// Correlates a command with the event that answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The request kinds the sidebar issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarOp {
    List,
    Add,
    Save,
    Remove,
}

impl SidebarOp {
    pub fn label(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Add => "Add",
            Self::Save => "Save",
            Self::Remove => "Remove",
        }
    }
}

/// Commands issued by the sidebar for the backend worker to execute.
#[derive(Debug)]
pub enum CoreCmd {
    /// Fetch attached editors and attachable templates.
    ListEditors {
        request: RequestId,
        file: FileRecord,
        options: ListOptions,
    },
    /// Attach a new instance of a template.
    CreateMetadata {
        request: RequestId,
        file: FileRecord,
        template: MetadataTemplate,
    },
    /// Apply patch operations to an attached instance.
    UpdateMetadata {
        request: RequestId,
        file: FileRecord,
        editor_id: String,
        template: MetadataTemplate,
        ops: Vec<PatchOp>,
    },
    /// Detach an instance.
    DeleteMetadata {
        request: RequestId,
        file: FileRecord,
        editor_id: String,
        template: MetadataTemplate,
    },
}

impl CoreCmd {
    pub fn request(&self) -> RequestId {
        match self {
            Self::ListEditors { request, .. }
            | Self::CreateMetadata { request, .. }
            | Self::UpdateMetadata { request, .. }
            | Self::DeleteMetadata { request, .. } => *request,
        }
    }

    pub fn op(&self) -> SidebarOp {
        match self {
            Self::ListEditors { .. } => SidebarOp::List,
            Self::CreateMetadata { .. } => SidebarOp::Add,
            Self::UpdateMetadata { .. } => SidebarOp::Save,
            Self::DeleteMetadata { .. } => SidebarOp::Remove,
        }
    }
}

/// Events produced by the backend worker and polled by the sidebar.
#[derive(Debug)]
pub enum CoreEvent {
    /// Response to [`CoreCmd::ListEditors`].
    EditorsLoaded {
        request: RequestId,
        editors: Vec<MetadataEditor>,
        templates: Vec<MetadataTemplate>,
    },
    /// Response containing a newly attached editor.
    EditorCreated {
        request: RequestId,
        editor: MetadataEditor,
    },
    /// Response containing the saved editor that replaces `editor_id`.
    EditorSaved {
        request: RequestId,
        editor_id: String,
        editor: MetadataEditor,
    },
    /// Response confirming `editor_id` was detached.
    EditorDeleted { request: RequestId, editor_id: String },
    /// The metadata API reported a failure.
    Failed {
        request: RequestId,
        op: SidebarOp,
        message: String,
    },
}

impl CoreEvent {
    pub fn request(&self) -> RequestId {
        match self {
            Self::EditorsLoaded { request, .. }
            | Self::EditorCreated { request, .. }
            | Self::EditorSaved { request, .. }
            | Self::EditorDeleted { request, .. }
            | Self::Failed { request, .. } => *request,
        }
    }
}
