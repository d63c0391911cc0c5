//! Library entry types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

/// Recognized remote file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// `.csv` — parsed into a table
    Table,
    /// `.txt` — decoded as a text block
    Text,
}

impl FileKind {
    /// Classify a remote object by its file extension.
    ///
    /// Unrecognized extensions return `None` and are ignored during refresh.
    pub fn from_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileKind::Table),
            "txt" => Some(FileKind::Text),
            _ => None,
        }
    }
}

/// Derive the entry name from a source file name by stripping its extension.
///
/// `fiction.csv` and `fiction.txt` both map to `fiction`; a name with no
/// extension is used as-is.
pub fn entry_name(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// A parsed tabular payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Parse CSV bytes into a table.
    ///
    /// Requires at least one header column and at least one data row;
    /// column names beyond non-emptiness are not validated.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::MalformedPayload {
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::MalformedPayload {
                name: name.to_string(),
                reason: "no header row".to_string(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| AppError::MalformedPayload {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(AppError::EmptyPayload(name.to_string()));
        }

        Ok(Table { headers, rows })
    }
}

/// Entry payload, tagged by kind.
///
/// The kind is decided once at fetch time from the file extension; nothing
/// downstream inspects payloads to figure out what they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileContent {
    Table(Table),
    Text { text: String },
}

impl FileContent {
    /// Decode a recognized remote file into its payload
    pub fn decode(kind: FileKind, file_name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        match kind {
            FileKind::Table => Ok(FileContent::Table(Table::parse(file_name, bytes)?)),
            // Invalid UTF-8 sequences are dropped rather than rejected
            FileKind::Text => Ok(FileContent::Text {
                text: String::from_utf8_lossy(bytes).into_owned(),
            }),
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            FileContent::Table(_) => FileKind::Table,
            FileContent::Text { .. } => FileKind::Text,
        }
    }

    /// Data row count for tables; `None` for text entries
    pub fn row_count(&self) -> Option<usize> {
        match self {
            FileContent::Table(table) => Some(table.row_count()),
            FileContent::Text { .. } => None,
        }
    }
}

/// A cached entry with its fetch timestamp
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub content: FileContent,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(content: FileContent) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }
}
