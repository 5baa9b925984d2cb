//! Editor list state and its pure transitions.
//!
//! Every transition takes the current snapshot by reference and returns a new
//! one, so holders of an older snapshot never observe a mutation.

use crate::models::{MetadataEditor, MetadataTemplate};
use serde::Serialize;

/// Known editors/templates plus transient loading and error flags.
///
/// `editors` and `templates` are both `None` until the first successful list
/// and both `Some` afterwards. Editor ids are unique within `editors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditorListState {
    pub editors: Option<Vec<MetadataEditor>>,
    pub templates: Option<Vec<MetadataTemplate>>,
    pub is_loading: bool,
    pub has_error: bool,
}

impl EditorListState {
    /// Whether the first list response has been applied.
    pub fn is_initialized(&self) -> bool {
        self.editors.is_some() && self.templates.is_some()
    }

    /// Look up an editor by instance id.
    pub fn editor(&self, id: &str) -> Option<&MetadataEditor> {
        self.editors
            .as_deref()
            .and_then(|editors| editors.iter().find(|editor| editor.id() == id))
    }

    /// Look up a template by its `(scope, template_key)` identity.
    pub fn template(&self, scope: &str, template_key: &str) -> Option<&MetadataTemplate> {
        self.templates.as_deref().and_then(|templates| {
            templates
                .iter()
                .find(|template| template.matches(scope, template_key))
        })
    }

    /// Ids of the current editors, in display order.
    pub fn editor_ids(&self) -> Vec<&str> {
        self.editors
            .as_deref()
            .map(|editors| editors.iter().map(MetadataEditor::id).collect())
            .unwrap_or_default()
    }

    /// Apply a successful list response.
    pub fn initialize(&self, editors: Vec<MetadataEditor>, templates: Vec<MetadataTemplate>) -> Self {
        Self {
            editors: Some(dedup_by_id(editors)),
            templates: Some(templates),
            is_loading: false,
            has_error: false,
        }
    }

    /// Replace the whole editor list.
    ///
    /// Later duplicates of an id are dropped so identities stay unique.
    /// No-op before initialization; use [`Self::initialize`] instead.
    pub fn replace_all(&self, editors: Vec<MetadataEditor>) -> Self {
        if !self.is_initialized() {
            tracing::warn!("ignoring replace of {} editors before load", editors.len());
            return self.clone();
        }
        Self {
            editors: Some(dedup_by_id(editors)),
            ..self.clone()
        }
    }

    /// Append an editor.
    ///
    /// An editor whose id is already present replaces that entry in place.
    /// No-op before initialization.
    pub fn insert(&self, editor: MetadataEditor) -> Self {
        let Some(editors) = self.editors.as_ref() else {
            tracing::warn!("ignoring insert of {} before editors loaded", editor.id());
            return self.clone();
        };
        let mut editors = editors.clone();
        match editors.iter_mut().find(|existing| existing.id() == editor.id()) {
            Some(slot) => *slot = editor,
            None => editors.push(editor),
        }
        Self {
            editors: Some(editors),
            ..self.clone()
        }
    }

    /// Remove the editor with instance id `id`; no-op if absent.
    pub fn remove_by_id(&self, id: &str) -> Self {
        let Some(editors) = self.editors.as_ref() else {
            return self.clone();
        };
        Self {
            editors: Some(
                editors
                    .iter()
                    .filter(|editor| editor.id() != id)
                    .cloned()
                    .collect(),
            ),
            ..self.clone()
        }
    }

    /// Swap the editor identified by `old_id` for `editor`, keeping its position.
    ///
    /// No-op if `old_id` is absent. Any other entry already carrying the new
    /// id is dropped.
    pub fn replace_one(&self, old_id: &str, editor: MetadataEditor) -> Self {
        let Some(editors) = self.editors.as_ref() else {
            return self.clone();
        };
        let Some(position) = editors.iter().position(|existing| existing.id() == old_id) else {
            return self.clone();
        };
        let new_id = editor.id().to_string();
        let mut replacement = Some(editor);
        let editors = editors
            .iter()
            .enumerate()
            .filter_map(|(index, existing)| {
                if index == position {
                    replacement.take()
                } else if existing.id() == new_id {
                    None
                } else {
                    Some(existing.clone())
                }
            })
            .collect();
        Self {
            editors: Some(editors),
            ..self.clone()
        }
    }

    /// Set the dirty flag of the editor with instance id `id`; no-op if absent.
    pub fn set_dirty(&self, id: &str, is_dirty: bool) -> Self {
        let mut next = self.clone();
        if let Some(editor) = next
            .editors
            .as_mut()
            .and_then(|editors| editors.iter_mut().find(|editor| editor.id() == id))
        {
            editor.is_dirty = is_dirty;
        }
        next
    }

    /// Set the busy flag.
    pub fn set_loading(&self, is_loading: bool) -> Self {
        Self {
            is_loading,
            ..self.clone()
        }
    }

    /// Set the error flag; lists are left as they are.
    pub fn set_error(&self, has_error: bool) -> Self {
        Self {
            has_error,
            ..self.clone()
        }
    }
}

fn dedup_by_id(editors: Vec<MetadataEditor>) -> Vec<MetadataEditor> {
    let mut unique: Vec<MetadataEditor> = Vec::with_capacity(editors.len());
    for editor in editors {
        if unique.iter().all(|existing| existing.id() != editor.id()) {
            unique.push(editor);
        } else {
            tracing::debug!("dropping duplicate editor {}", editor.id());
        }
    }
    unique
}
