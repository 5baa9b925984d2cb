//! Shared test-only helpers for metasidebar_core.

use crate::models::{MetadataEditor, MetadataInstance, MetadataTemplate};
use crate::store::EditorListState;
use serde_json::Map;

/// Enterprise-scoped template with the given key.
pub(crate) fn template(key: &str) -> MetadataTemplate {
    MetadataTemplate::new("enterprise", key, key.to_uppercase())
}

/// Clean editor of template `t1` with a fixed id.
pub(crate) fn editor(id: &str) -> MetadataEditor {
    MetadataEditor::new(
        MetadataInstance {
            id: id.to_string(),
            template_key: "t1".to_string(),
            scope: "enterprise".to_string(),
            can_edit: true,
            data: Map::new(),
        },
        template("t1"),
    )
}

/// Initialized state holding editors with `ids` and a single template `t1`.
pub(crate) fn state_with(ids: &[&str]) -> EditorListState {
    EditorListState::default().initialize(
        ids.iter().map(|id| editor(id)).collect(),
        vec![template("t1")],
    )
}
