//! API error type rendered as structured JSON.
//!
//! Every error surfaced to a client carries a stable machine field plus
//! a human message; raw tool stderr is fine, stack traces are not.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn internal(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &str {
        &self.error
    }
}

impl From<sauti_core::Error> for ApiError {
    fn from(err: sauti_core::Error) -> Self {
        let machine = match &err {
            sauti_core::Error::Synthesis(_) => "Synthesis failed",
            sauti_core::Error::Transcode(_) => "Transcode failed",
            sauti_core::Error::ToolMissing(_) => "Tool unavailable",
            sauti_core::Error::Io(_) => "Storage error",
        };
        Self::internal(machine, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(error = %self.error, message = %self.message, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.error,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
