//! Crate-wide error types
//!
//! Every component boundary reports through `AppError`; handlers convert it
//! into a JSON error response with an HTTP status and a stable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ocr::OcrError;
use crate::storage::StorageError;

/// Unified application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote store or OCR service unreachable/errored at the transport level
    #[error("transport error: {0}")]
    Transport(String),

    /// Uploaded table parsed but contains no data rows
    #[error("file '{0}' has no data rows")]
    EmptyPayload(String),

    /// Byte stream could not be parsed into a table with a header row
    #[error("could not parse '{name}': {reason}")]
    MalformedPayload { name: String, reason: String },

    /// Fatal precondition: required credentials were not supplied
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Structured error reported by the text-extraction service
    #[error("OCR service error: {0}")]
    OcrService(String),

    /// An image is already staged and must be approved or cancelled first
    #[error("an image is already pending approval")]
    PendingImageBusy,

    /// No staged image to approve, submit, or cancel
    #[error("no pending image")]
    NoPendingImage,

    /// The staged image has not been approved for submission
    #[error("pending image has not been approved")]
    NotApproved,

    /// Named entry does not exist in the cache
    #[error("file not found: {0}")]
    NotFound(String),

    /// Malformed or incomplete request
    #[error("invalid request: {0}")]
    BadRequest(String),
}

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::EmptyPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedPayload { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingCredentials(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::OcrService(_) => StatusCode::BAD_GATEWAY,
            Self::PendingImageBusy => StatusCode::CONFLICT,
            Self::NoPendingImage => StatusCode::NOT_FOUND,
            Self::NotApproved => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::EmptyPayload(_) => "EMPTY_PAYLOAD",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::MissingCredentials(_) => "MISSING_CREDENTIALS",
            Self::OcrService(_) => "OCR_SERVICE_ERROR",
            Self::PendingImageBusy => "PENDING_IMAGE_BUSY",
            Self::NoPendingImage => "NO_PENDING_IMAGE",
            Self::NotApproved => "NOT_APPROVED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        });
        (status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(key),
            StorageError::Transport(msg) => AppError::Transport(msg),
        }
    }
}

impl From<OcrError> for AppError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::Transport(msg) => AppError::Transport(msg),
            OcrError::Service(msg) => AppError::OcrService(msg),
            OcrError::MalformedResponse(msg) => AppError::OcrService(msg),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingVar(var) => AppError::MissingCredentials(var.to_string()),
            ConfigError::InvalidVar { var, value } => {
                AppError::BadRequest(format!("invalid value for {var}: {value}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_by_kind() {
        assert_eq!(
            AppError::Transport("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::EmptyPayload("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::MissingCredentials("S3_ACCESS_KEY_ID".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::PendingImageBusy.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoPendingImage.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::NotFound("fiction".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn storage_errors_translate() {
        let err: AppError = StorageError::Transport("refused".into()).into();
        assert!(matches!(err, AppError::Transport(_)));

        let err: AppError = StorageError::NotFound("fiction.csv".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn ocr_errors_translate() {
        let err: AppError = OcrError::Service("invalid key".into()).into();
        assert!(matches!(err, AppError::OcrService(_)));

        let err: AppError = OcrError::Transport("timed out".into()).into();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn missing_config_vars_are_missing_credentials() {
        let err: AppError = ConfigError::MissingVar("OCR_API_KEY").into();
        assert!(matches!(err, AppError::MissingCredentials(var) if var == "OCR_API_KEY"));
    }
}
