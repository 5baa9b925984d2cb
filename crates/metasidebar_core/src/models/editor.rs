//! Metadata instances, editors, and list responses.

use super::template::MetadataTemplate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One metadata instance attached to a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataInstance {
    pub id: String,
    pub template_key: String,
    pub scope: String,
    #[serde(default = "default_can_edit")]
    pub can_edit: bool,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn default_can_edit() -> bool {
    true
}

impl MetadataInstance {
    /// Create an empty instance of `template` with a fresh id.
    pub fn for_template(template: &MetadataTemplate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            template_key: template.template_key.clone(),
            scope: template.scope.clone(),
            can_edit: true,
            data: Map::new(),
        }
    }

    /// Whether this instance was created from `template`.
    pub fn is_instance_of(&self, template: &MetadataTemplate) -> bool {
        template.matches(&self.scope, &self.template_key)
    }
}

/// An attached instance bound to its template, plus local dirty tracking.
///
/// Identity is `instance.id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEditor {
    pub instance: MetadataInstance,
    pub template: MetadataTemplate,
    #[serde(default)]
    pub is_dirty: bool,
}

impl MetadataEditor {
    /// Bind an instance to its template with a clean dirty flag.
    pub fn new(instance: MetadataInstance, template: MetadataTemplate) -> Self {
        Self {
            instance,
            template,
            is_dirty: false,
        }
    }

    /// Editor identity.
    pub fn id(&self) -> &str {
        self.instance.id.as_str()
    }
}

/// A successful list response: attached editors plus attachable templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorSet {
    pub editors: Vec<MetadataEditor>,
    pub templates: Vec<MetadataTemplate>,
}

/// Options for a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Bypass any cached list response.
    #[serde(default)]
    pub force_fetch: bool,
    /// Include the free-form properties template and its instances.
    #[serde(default = "default_include_properties")]
    pub include_properties: bool,
}

fn default_include_properties() -> bool {
    true
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            force_fetch: false,
            include_properties: true,
        }
    }
}
