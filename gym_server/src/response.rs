//! Structured response envelope and error mapping.
//!
//! Every reply carries `success` and a human-readable `message`. Core errors
//! never escape as panics or framework-default bodies; they are mapped here.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gym_core::{Error, ErrorKind};
use serde_json::json;

#[must_use]
pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::MissingCredential => StatusCode::UNAUTHORIZED,
        ErrorKind::InvalidCredential => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A core error on its way out of a handler
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    /// Operation-specific message used for internal failures
    context: Option<&'static str>,
}

impl ApiError {
    pub fn context(mut self, message: &'static str) -> Self {
        self.context = Some(message);
        self
    }

    pub fn error(&self) -> &Error {
        &self.error
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self {
            error,
            context: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.error.kind();
        let status = status_for(kind);

        let body = match &self.error {
            Error::InvalidIndex { .. } => json!({
                "success": false,
                "message": "Invalid exercise index",
            }),
            Error::InvalidCredential(reason) => {
                tracing::debug!("Rejected credential: {}", reason);
                json!({"success": false, "message": "Invalid or expired token"})
            }
            Error::Unavailable(detail) => {
                tracing::warn!("Store unavailable: {}", detail);
                json!({"success": false, "message": "Database not connected"})
            }
            err if kind == ErrorKind::Internal => {
                tracing::error!("{}: {}", self.context.unwrap_or("Internal error"), err);
                json!({
                    "success": false,
                    "message": self.context.unwrap_or("Internal server error"),
                    "error": err.to_string(),
                })
            }
            err => json!({"success": false, "message": err.to_string()}),
        };

        let mut resp = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            resp.headers_mut()
                .insert("retry-after", HeaderValue::from_static("5"));
        }
        resp
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
