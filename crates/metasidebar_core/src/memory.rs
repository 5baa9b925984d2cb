//! In-memory metadata service shared by the HTTP server and tests.

use crate::api::MetadataApi;
use crate::constants::ENTERPRISE_SCOPE;
use crate::error::ApiError;
use crate::models::{
    EditorSet, FieldType, FileRecord, ListOptions, MetadataEditor, MetadataInstance,
    MetadataTemplate, TemplateField,
};
use crate::patch::{apply_patch, PatchOp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

/// Instance attached to a file in seed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedInstance {
    pub file_id: String,
    pub instance: MetadataInstance,
}

/// Initial contents for a [`MemoryMetadataApi`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub templates: Vec<MetadataTemplate>,
    #[serde(default)]
    pub instances: Vec<SeedInstance>,
}

impl SeedData {
    /// Small demo data set: two files, three templates, one attached instance.
    pub fn demo() -> Self {
        let contract = MetadataTemplate::new(ENTERPRISE_SCOPE, "contract", "Contract")
            .with_field(TemplateField::new("client", "Client", FieldType::String))
            .with_field(TemplateField::new("amount", "Amount", FieldType::Float))
            .with_field(TemplateField::new("signed_on", "Signed On", FieldType::Date))
            .with_field(TemplateField {
                options: vec!["draft".into(), "active".into(), "expired".into()],
                ..TemplateField::new("status", "Status", FieldType::Enum)
            });
        let mut audit = MetadataTemplate::new(ENTERPRISE_SCOPE, "audit", "Audit Trail")
            .with_field(TemplateField::new("reviewer", "Reviewer", FieldType::String));
        audit.hidden = true;

        let mut instance = MetadataInstance::for_template(&contract);
        instance.id = "contract-1001".to_string();
        instance.data.insert("client".into(), "Acme Corp".into());
        instance.data.insert("status".into(), "draft".into());

        Self {
            files: vec![
                FileRecord::new("1001", "master-services-agreement.pdf", true),
                FileRecord::new("1002", "shared-with-me.docx", false),
            ],
            templates: vec![MetadataTemplate::properties(), contract, audit],
            instances: vec![SeedInstance {
                file_id: "1001".to_string(),
                instance,
            }],
        }
    }
}

/// Failure loading seed data from disk.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Default)]
struct MemoryState {
    files: HashMap<String, FileRecord>,
    templates: Vec<MetadataTemplate>,
    instances: HashMap<String, Vec<MetadataInstance>>,
}

impl MemoryState {
    fn file(&self, file_id: &str) -> Result<&FileRecord, ApiError> {
        self.files
            .get(file_id)
            .ok_or_else(|| ApiError::NotFound(format!("file '{}'", file_id)))
    }

    fn writable_file(&self, file_id: &str) -> Result<&FileRecord, ApiError> {
        let file = self.file(file_id)?;
        if !file.can_edit() {
            return Err(ApiError::Forbidden(format!(
                "no upload permission on file '{}'",
                file_id
            )));
        }
        Ok(file)
    }

    fn template(&self, scope: &str, template_key: &str) -> Result<&MetadataTemplate, ApiError> {
        self.templates
            .iter()
            .find(|template| template.matches(scope, template_key))
            .ok_or_else(|| ApiError::NotFound(format!("template '{}/{}'", scope, template_key)))
    }

    fn editor_for(&self, file: &FileRecord, instance: &MetadataInstance) -> Option<MetadataEditor> {
        let template = self
            .templates
            .iter()
            .find(|template| instance.is_instance_of(template))?;
        let mut instance = instance.clone();
        instance.can_edit = file.can_edit();
        Some(MetadataEditor::new(instance, template.clone()))
    }
}

/// Thread-safe in-memory metadata service.
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct MemoryMetadataApi {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryMetadataApi {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service pre-populated with `seed`.
    pub fn from_seed(seed: SeedData) -> Self {
        let api = Self::new();
        if let Ok(mut state) = api.state() {
            for file in seed.files {
                state.files.insert(file.id.clone(), file);
            }
            state.templates = seed.templates;
            for SeedInstance { file_id, instance } in seed.instances {
                state.instances.entry(file_id).or_default().push(instance);
            }
        }
        api
    }

    /// Load seed data from a JSON file.
    ///
    /// # Errors
    /// Returns [`SeedError`] when the file cannot be read or parsed.
    pub fn load_seed(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedData = serde_json::from_str(&raw)?;
        info!(
            "Loaded seed with {} files, {} templates, {} instances",
            seed.files.len(),
            seed.templates.len(),
            seed.instances.len()
        );
        Ok(Self::from_seed(seed))
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        self.inner.lock().map_err(|_| ApiError::Internal)
    }

    /// Register or replace a file record.
    pub fn register_file(&self, file: FileRecord) -> Result<(), ApiError> {
        self.state()?.files.insert(file.id.clone(), file);
        Ok(())
    }

    /// Register or replace a template.
    pub fn register_template(&self, template: MetadataTemplate) -> Result<(), ApiError> {
        let mut state = self.state()?;
        match state
            .templates
            .iter_mut()
            .find(|existing| existing.matches(&template.scope, &template.template_key))
        {
            Some(slot) => *slot = template,
            None => state.templates.push(template),
        }
        Ok(())
    }

    /// Fetch a registered file record.
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] for unknown ids.
    pub fn file(&self, file_id: &str) -> Result<FileRecord, ApiError> {
        self.state()?.file(file_id).cloned()
    }

    /// All non-hidden templates.
    pub fn templates(&self) -> Result<Vec<MetadataTemplate>, ApiError> {
        Ok(self
            .state()?
            .templates
            .iter()
            .filter(|template| !template.hidden)
            .cloned()
            .collect())
    }
}

impl MetadataApi for MemoryMetadataApi {
    fn get_editors(&self, file: &FileRecord, options: &ListOptions) -> Result<EditorSet, ApiError> {
        let state = self.state()?;
        let file = state.file(&file.id)?;
        let visible = |template: &MetadataTemplate| {
            !template.hidden && (options.include_properties || !template.is_properties())
        };

        let templates: Vec<MetadataTemplate> = state
            .templates
            .iter()
            .filter(|template| visible(template))
            .cloned()
            .collect();
        let editors: Vec<MetadataEditor> = state
            .instances
            .get(&file.id)
            .map(|instances| {
                instances
                    .iter()
                    .filter_map(|instance| state.editor_for(file, instance))
                    .filter(|editor| visible(&editor.template))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "listed {} editors and {} templates for file {}",
            editors.len(),
            templates.len(),
            file.id
        );
        Ok(EditorSet { editors, templates })
    }

    fn create_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
    ) -> Result<MetadataEditor, ApiError> {
        let mut state = self.state()?;
        let file = state.writable_file(&file.id)?.clone();
        let template = state
            .template(&template.scope, &template.template_key)?
            .clone();
        if template.hidden {
            return Err(ApiError::BadRequest(format!(
                "template '{}' cannot be attached",
                template.template_key
            )));
        }

        let instances = state.instances.entry(file.id.clone()).or_default();
        if instances
            .iter()
            .any(|instance| instance.is_instance_of(&template))
        {
            return Err(ApiError::Conflict(format!(
                "template '{}' is already attached to file '{}'",
                template.template_key, file.id
            )));
        }
        let mut instance = MetadataInstance::for_template(&template);
        instance.can_edit = file.can_edit();
        instances.push(instance.clone());
        info!(
            "attached template {} to file {} as {}",
            template.template_key, file.id, instance.id
        );
        Ok(MetadataEditor::new(instance, template))
    }

    fn update_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
        ops: &[PatchOp],
    ) -> Result<MetadataEditor, ApiError> {
        let mut state = self.state()?;
        let file = state.writable_file(&file.id)?.clone();
        let template = state
            .template(&template.scope, &template.template_key)?
            .clone();
        let instance = state
            .instances
            .get_mut(&file.id)
            .and_then(|instances| {
                instances
                    .iter_mut()
                    .find(|instance| instance.is_instance_of(&template))
            })
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "template '{}' is not attached to file '{}'",
                    template.template_key, file.id
                ))
            })?;
        instance.data = apply_patch(&instance.data, ops)?;
        let mut instance = instance.clone();
        instance.can_edit = file.can_edit();
        Ok(MetadataEditor::new(instance, template))
    }

    fn delete_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
    ) -> Result<(), ApiError> {
        let mut state = self.state()?;
        let file_id = state.writable_file(&file.id)?.id.clone();
        let instances = state.instances.entry(file_id.clone()).or_default();
        let before = instances.len();
        instances.retain(|instance| !instance.is_instance_of(template));
        if instances.len() == before {
            return Err(ApiError::NotFound(format!(
                "template '{}' is not attached to file '{}'",
                template.template_key, file_id
            )));
        }
        info!("detached template {} from file {}", template.template_key, file_id);
        Ok(())
    }
}
