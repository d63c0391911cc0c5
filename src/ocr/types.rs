//! OCR types

use serde::Serialize;
use thiserror::Error;

/// A staged image occupying the single pending slot
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub approved: bool,
}

impl PendingImage {
    pub fn new(file_name: String, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            bytes,
            approved: false,
        }
    }
}

/// Observable state of the pending slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PendingStatus {
    Absent,
    AwaitingApproval { file_name: String },
    Approved { file_name: String },
}

/// Result of a completed OCR submission
#[derive(Debug, Clone, Serialize)]
pub struct OcrOutcome {
    /// Name of the derived text entry now in the cache
    pub name: String,
    /// Remote object the extracted text was written to
    pub object_key: String,
    /// The extracted text
    pub text: String,
}

/// OCR error types
#[derive(Debug, Error)]
pub enum OcrError {
    /// The extraction service was unreachable
    #[error("OCR service unreachable: {0}")]
    Transport(String),

    /// The service answered with a structured processing error
    #[error("OCR processing failed: {0}")]
    Service(String),

    /// The response had no usable parsed result
    #[error("unexpected OCR response: {0}")]
    MalformedResponse(String),
}
