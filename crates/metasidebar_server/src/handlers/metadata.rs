//! Metadata instance HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use metasidebar_core::models::{EditorSet, ListOptions, MetadataEditor, MetadataTemplate};
use metasidebar_core::patch::PatchOp;
use metasidebar_core::MetadataApi;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub include_properties: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMetadataRequest {
    pub scope: String,
    pub template_key: String,
}

fn template_ref(scope: String, template_key: String) -> MetadataTemplate {
    // The service resolves templates by (scope, key) only.
    let display_name = template_key.clone();
    MetadataTemplate::new(scope, template_key, display_name)
}

fn wants_fresh(headers: &HeaderMap) -> bool {
    headers
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("no-cache"))
}

/// List the editors attached to a file and the templates it may use.
///
/// `include_properties` defaults to the server configuration.
///
/// # Errors
/// Returns 404 when the file is unknown.
pub async fn list_metadata(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<EditorSet>, HttpError> {
    let file = state.api.file(&file_id)?;
    let options = ListOptions {
        force_fetch: wants_fresh(&headers),
        include_properties: query
            .include_properties
            .unwrap_or(state.config.include_properties),
    };
    Ok(Json(state.api.get_editors(&file, &options)?))
}

/// Attach a new instance of a template to a file.
///
/// # Returns
/// `201 Created` with the new editor.
///
/// # Errors
/// Returns 404 for unknown files or templates, 403 without upload permission,
/// 409 when the template is already attached, and 400 for hidden templates.
pub async fn create_metadata(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(req): Json<CreateMetadataRequest>,
) -> Result<(StatusCode, Json<MetadataEditor>), HttpError> {
    let file = state.api.file(&file_id)?;
    let template = template_ref(req.scope, req.template_key);
    let editor = state.api.create_metadata(&file, &template)?;
    Ok((StatusCode::CREATED, Json(editor)))
}

/// Apply patch operations to an attached instance.
///
/// # Errors
/// Returns 404 when nothing is attached and 412 when a patch op fails;
/// no op is applied in that case.
pub async fn update_metadata(
    State(state): State<AppState>,
    Path((file_id, scope, template_key)): Path<(String, String, String)>,
    Json(ops): Json<Vec<PatchOp>>,
) -> Result<Json<MetadataEditor>, HttpError> {
    let file = state.api.file(&file_id)?;
    let template = template_ref(scope, template_key);
    Ok(Json(state.api.update_metadata(&file, &template, &ops)?))
}

/// Detach an instance from a file.
///
/// # Returns
/// `204 No Content`.
pub async fn delete_metadata(
    State(state): State<AppState>,
    Path((file_id, scope, template_key)): Path<(String, String, String)>,
) -> Result<StatusCode, HttpError> {
    let file = state.api.file(&file_id)?;
    let template = template_ref(scope, template_key);
    state.api.delete_metadata(&file, &template)?;
    Ok(StatusCode::NO_CONTENT)
}
