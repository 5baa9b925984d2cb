//! HTTP error mapping for API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metasidebar_core::ApiError;
use serde_json::json;
use thiserror::Error;

/// Handler error carrying the service failure it maps from.
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

/// Status code the client maps back onto the same [`ApiError`] variant.
pub fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Conflict(_) => StatusCode::CONFLICT,
        ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        ApiError::BadRequest(_) | ApiError::Decode(_) => StatusCode::BAD_REQUEST,
        ApiError::PatchFailed(_) => StatusCode::PRECONDITION_FAILED,
        ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
        ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::PatchFailed(msg)
            | ApiError::Decode(msg) => msg.clone(),
            ApiError::Transport(msg) => {
                tracing::error!("Upstream error: {}", msg);
                "Upstream error".to_string()
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {:?}", self.0);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failure starting an [`crate::EmbeddedServer`].
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to start runtime: {0}")]
    Runtime(String),

    #[error("failed to bind server socket: {0}")]
    Bind(String),

    #[error("failed to spawn server thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_error_has_a_distinct_status() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::PatchFailed("x".into()), StatusCode::PRECONDITION_FAILED),
            (ApiError::Transport("x".into()), StatusCode::BAD_GATEWAY),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{:?}", err);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let response = HttpError(ApiError::Transport("10.0.0.3 refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
