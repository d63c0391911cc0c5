//! Text-extraction clients
//!
//! Defines the extractor trait and the ocr.space HTTP implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OcrConfig;

use super::types::OcrError;

/// External text-extraction capability
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from image bytes.
    ///
    /// Any non-success response shape is an error, never a panic or an
    /// empty-but-trusted result.
    async fn extract(
        &self,
        image: &[u8],
        file_name: &str,
        language: &str,
    ) -> Result<String, OcrError>;
}

/// ocr.space-style HTTP extractor
pub struct OcrSpaceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OcrSpaceClient {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

/// Mime type for a staged image, by file extension
fn image_mime(file_name: &str) -> &'static str {
    match file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    /// The service returns either a string or an array of strings here
    #[serde(default)]
    error_message: Option<serde_json::Value>,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceResponse {
    fn error_text(&self) -> String {
        match &self.error_message {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => "unknown OCR error".to_string(),
        }
    }

    fn into_text(self) -> Result<String, OcrError> {
        if self.is_errored_on_processing {
            return Err(OcrError::Service(self.error_text()));
        }
        let text = self
            .parsed_results
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0).parsed_text)
                }
            })
            .ok_or_else(|| OcrError::MalformedResponse("no parsed results".to_string()))?;
        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceClient {
    async fn extract(
        &self,
        image: &[u8],
        file_name: &str,
        language: &str,
    ) -> Result<String, OcrError> {
        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", language.to_string())
            .part("file", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Service(format!("{status}: {body}")));
        }

        let parsed: OcrSpaceResponse = response
            .json()
            .await
            .map_err(|e| OcrError::MalformedResponse(e.to_string()))?;

        parsed.into_text()
    }
}

/// Scripted extractor for tests, counting every submission
#[cfg(test)]
pub struct MockExtractor {
    pub response: Result<String, String>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockExtractor {
    pub fn ok(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TextExtractor for MockExtractor {
    async fn extract(
        &self,
        _image: &[u8],
        _file_name: &str,
        _language: &str,
    ) -> Result<String, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(OcrError::Service(message.clone())),
        }
    }
}
