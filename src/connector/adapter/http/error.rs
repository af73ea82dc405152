use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::{DomainError, ErrorBody};

/// JSON error response carrying a stable error code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::new("BAD_REQUEST", message),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "BAD_REQUEST" | "PIN_NO_MATCH" | "PIN_UNPINNED" | "PIN_FALLBACK_INVALID" => {
            StatusCode::BAD_REQUEST
        }
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "BOUNDARY_DENY" => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let body = err.to_error_body();
        let status = status_for_code(&body.code);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
