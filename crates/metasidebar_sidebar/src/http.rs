//! Blocking HTTP implementation of [`MetadataApi`] against the metadata server.

use metasidebar_core::models::{
    EditorSet, FileRecord, ListOptions, MetadataEditor, MetadataTemplate,
};
use metasidebar_core::patch::PatchOp;
use metasidebar_core::{ApiError, MetadataApi};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{header, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
struct CreateMetadataRequest<'a> {
    scope: &'a str,
    template_key: &'a str,
}

/// Metadata API client speaking to `/api/files/...` routes.
#[derive(Clone)]
pub struct HttpMetadataApi {
    client: Client,
    base_url: Url,
}

impl HttpMetadataApi {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns [`ApiError::BadRequest`] for an unparsable URL and
    /// [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim()).map_err(|err| {
            ApiError::BadRequest(format!("invalid server url '{}': {}", base_url, err))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::BadRequest(format!(
                "server url '{}' cannot be a base",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api");
            path.extend(segments);
        }
        url
    }

    fn instance_url(&self, file: &FileRecord, template: &MetadataTemplate) -> Url {
        self.url(&[
            "files",
            file.id.as_str(),
            "metadata",
            template.scope.as_str(),
            template.template_key.as_str(),
        ])
    }

    /// Fetch the subject file record.
    ///
    /// # Errors
    /// Returns the mapped [`ApiError`] for transport or status failures.
    pub fn get_file(&self, file_id: &str) -> Result<FileRecord, ApiError> {
        let response = send(self.client.get(self.url(&["files", file_id])))?;
        decode(response)
    }
}

fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request
        .send()
        .map_err(|err| ApiError::Transport(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(error_for_status(status, &body))
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Map an error response back onto [`ApiError`].
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body.to_string()
            }
        });
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
        StatusCode::PRECONDITION_FAILED | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::PatchFailed(message)
        }
        StatusCode::INTERNAL_SERVER_ERROR => ApiError::Internal,
        _ => ApiError::Transport(format!("{}: {}", status, message)),
    }
}

impl MetadataApi for HttpMetadataApi {
    fn get_editors(&self, file: &FileRecord, options: &ListOptions) -> Result<EditorSet, ApiError> {
        let mut request = self
            .client
            .get(self.url(&["files", file.id.as_str(), "metadata"]))
            .query(&[("include_properties", options.include_properties)]);
        if options.force_fetch {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }
        decode(send(request)?)
    }

    fn create_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
    ) -> Result<MetadataEditor, ApiError> {
        let request = self
            .client
            .post(self.url(&["files", file.id.as_str(), "metadata"]))
            .json(&CreateMetadataRequest {
                scope: &template.scope,
                template_key: &template.template_key,
            });
        decode(send(request)?)
    }

    fn update_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
        ops: &[PatchOp],
    ) -> Result<MetadataEditor, ApiError> {
        let request = self
            .client
            .patch(self.instance_url(file, template))
            .json(ops);
        decode(send(request)?)
    }

    fn delete_metadata(
        &self,
        file: &FileRecord,
        template: &MetadataTemplate,
    ) -> Result<(), ApiError> {
        send(self.client.delete(self.instance_url(file, template)))?;
        Ok(())
    }
}
