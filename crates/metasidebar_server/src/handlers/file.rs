//! File and template HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use metasidebar_core::models::{FileRecord, MetadataTemplate};

/// Fetch a file record by id.
///
/// # Errors
/// Returns 404 when the file is unknown.
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileRecord>, HttpError> {
    Ok(Json(state.api.file(&file_id)?))
}

/// List every non-hidden template.
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<MetadataTemplate>>, HttpError> {
    Ok(Json(state.api.templates()?))
}
