//! Metadata template schemas.

use crate::constants::{GLOBAL_SCOPE, PROPERTIES_TEMPLATE_KEY};
use serde::{Deserialize, Serialize};

/// Value type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Float,
    Date,
    Enum,
    MultiSelect,
}

/// One typed key in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub key: String,
    pub display_name: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl TemplateField {
    /// Create a visible field without options.
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            field_type,
            options: Vec::new(),
            hidden: false,
        }
    }
}

/// Schema a metadata instance is created from.
///
/// Identity is `(scope, template_key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTemplate {
    pub template_key: String,
    pub scope: String,
    pub display_name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub fields: Vec<TemplateField>,
}

impl MetadataTemplate {
    /// Create a visible template without fields.
    pub fn new(
        scope: impl Into<String>,
        template_key: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            template_key: template_key.into(),
            scope: scope.into(),
            display_name: display_name.into(),
            hidden: false,
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style.
    pub fn with_field(mut self, field: TemplateField) -> Self {
        self.fields.push(field);
        self
    }

    /// The free-form key/value template gated by the properties feature flag.
    pub fn properties() -> Self {
        Self::new(GLOBAL_SCOPE, PROPERTIES_TEMPLATE_KEY, "Custom Metadata")
    }

    /// Whether this is the free-form properties template.
    pub fn is_properties(&self) -> bool {
        self.scope == GLOBAL_SCOPE && self.template_key == PROPERTIES_TEMPLATE_KEY
    }

    /// Whether `scope`/`template_key` identify this template.
    pub fn matches(&self, scope: &str, template_key: &str) -> bool {
        self.scope == scope && self.template_key == template_key
    }
}
