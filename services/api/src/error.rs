use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use equipment_report::ReportError;
use equipment_stats::SummaryError;
use equipment_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned from every handler; rendered as `{"error": message}`.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }

    pub fn no_data() -> Self {
        Self::not_found("No data available")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }

        let body = Json(json!({ "error": self.message }));
        if self.status == StatusCode::UNAUTHORIZED {
            let challenge = [(header::WWW_AUTHENTICATE, "Basic realm=\"equipment\"")];
            return (self.status, challenge, body).into_response();
        }
        (self.status, body).into_response()
    }
}

impl From<SummaryError> for ApiError {
    fn from(e: SummaryError) -> Self {
        // every summary failure is user-correctable
        Self::bad_request(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::internal_error(e.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        Self::internal_error(e.to_string())
    }
}

// axum's own extractor failures keep their status but use the JSON body
impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self { status: e.status(), message: e.body_text() }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self { status: e.status(), message: e.body_text() }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self { status: e.status(), message: e.body_text() }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::internal_error(format!("worker task failed: {e}"))
    }
}
