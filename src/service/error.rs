// Errors surfaced by services and their HTTP rendering.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use tracing::error;

use crate::backend::BackendError;
use crate::schema::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("too many requests")]
    RateLimited { retry_after: Duration },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("push delivery is disabled")]
    PushDisabled,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::PushDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Backend(e) => match e {
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::Conflict(_) => StatusCode::CONFLICT,
                BackendError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                BackendError::Transport(_) | BackendError::Unavailable { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                BackendError::Unauthorized
                | BackendError::Rejected { .. }
                | BackendError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            ServiceError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whole seconds to wait, rounded up so clients never retry early.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ServiceError::Validation(fields) => (
                status,
                Json(json!({"error": "validation failed", "fields": fields})),
            )
                .into_response(),
            ServiceError::RateLimited { retry_after } => {
                let secs = retry_after_secs(retry_after);
                let mut resp = (
                    status,
                    Json(json!({"error": "too many requests", "retry_after_secs": secs})),
                )
                    .into_response();
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                resp
            }
            other => {
                if status.is_server_error() {
                    error!(component = "service", event = "request_failed", error = %other, "request failed");
                }
                (status, Json(json!({"error": other.to_string()}))).into_response()
            }
        }
    }
}
