//! Subject file record consumed read-only by the sidebar.

use serde::{Deserialize, Serialize};

/// Permission bits the sidebar reads from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePermissions {
    #[serde(default)]
    pub can_upload: bool,
}

/// A file that metadata instances are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: FilePermissions,
}

impl FileRecord {
    /// Create a file record.
    ///
    /// # Arguments
    /// - `id`: Identity used by the metadata API.
    /// - `name`: Display name.
    /// - `can_upload`: Upload permission, which doubles as edit permission.
    pub fn new(id: impl Into<String>, name: impl Into<String>, can_upload: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: FilePermissions { can_upload },
        }
    }

    /// Whether the current user may add, edit, or remove metadata on this file.
    pub fn can_edit(&self) -> bool {
        self.permissions.can_upload
    }
}
