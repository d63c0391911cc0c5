//! Cached library state
//!
//! Process-local mirror of the remote bucket. The remote store is the only
//! authority for `refresh`; `upsert_local` is a short-lived optimistic
//! overlay that the next full refresh reconciles.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::storage::ObjectStore;

use super::types::{entry_name, CacheEntry, FileContent, FileKind};

/// Per-file refresh report
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Outcome of a completed refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    /// Entry names now in the cache
    pub loaded: Vec<String>,
    /// Files that failed to download or parse, with reasons
    pub skipped: Vec<SkippedFile>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    refreshed_at: Option<DateTime<Utc>>,
    invalidated: bool,
}

/// Shared library cache with a time-boxed validity window
#[derive(Clone)]
pub struct LibraryCache {
    inner: Arc<RwLock<CacheInner>>,
    ttl_secs: i64,
}

impl LibraryCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Current cache contents, without contacting the remote store
    pub async fn get_all(&self) -> HashMap<String, CacheEntry> {
        self.inner.read().await.entries.clone()
    }

    pub async fn get(&self, name: &str) -> Option<CacheEntry> {
        self.inner.read().await.entries.get(name).cloned()
    }

    /// Entry names in sorted order
    pub async fn names(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the cached remote state can no longer be trusted as current.
    ///
    /// True when explicitly invalidated, never refreshed, or when the last
    /// refresh is older than the validity window. Stale contents may still
    /// be shown while a refresh is pending.
    pub async fn is_stale(&self) -> bool {
        let inner = self.inner.read().await;
        if inner.invalidated {
            return true;
        }
        match inner.refreshed_at {
            Some(at) => Utc::now() - at > Duration::seconds(self.ttl_secs),
            None => true,
        }
    }

    /// Mark the cache stale without clearing data
    pub async fn invalidate(&self) {
        self.inner.write().await.invalidated = true;
    }

    /// Insert or overwrite a single entry without contacting the remote
    /// store. Used right after a successful upload or OCR write so the new
    /// data is visible before the next full refresh.
    pub async fn upsert_local(&self, name: &str, content: FileContent) {
        let mut inner = self.inner.write().await;
        inner.entries.insert(name.to_string(), CacheEntry::new(content));
    }

    /// Replace the entire cache with the current remote contents.
    ///
    /// A failure to download or parse one file skips that file and is
    /// reported per-file; it never aborts the rest. A failure to list the
    /// bucket at all returns the error and leaves the old contents
    /// untouched.
    pub async fn refresh(&self, store: &dyn ObjectStore) -> Result<RefreshReport, AppError> {
        let mut file_names = store.list().await?;
        file_names.sort();

        let now = Utc::now();
        let mut fresh: HashMap<String, CacheEntry> = HashMap::new();
        let mut loaded = Vec::new();
        let mut skipped = Vec::new();

        for file_name in file_names {
            let Some(kind) = FileKind::from_name(&file_name) else {
                continue;
            };
            let name = entry_name(&file_name).to_string();

            if fresh.contains_key(&name) {
                tracing::warn!(file = %file_name, "skipping: name '{name}' already loaded");
                skipped.push(SkippedFile {
                    file: file_name,
                    reason: format!("name collision with an already-loaded '{name}'"),
                });
                continue;
            }

            let bytes = match store.download(&file_name).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(file = %file_name, error = %err, "skipping: download failed");
                    skipped.push(SkippedFile {
                        file: file_name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match FileContent::decode(kind, &file_name, &bytes) {
                Ok(content) => {
                    fresh.insert(
                        name.clone(),
                        CacheEntry {
                            content,
                            fetched_at: now,
                        },
                    );
                    loaded.push(name);
                }
                Err(err) => {
                    tracing::warn!(file = %file_name, error = %err, "skipping: parse failed");
                    skipped.push(SkippedFile {
                        file: file_name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        // Wholesale swap: observers never see a half-refreshed mix
        let mut inner = self.inner.write().await;
        inner.entries = fresh;
        inner.refreshed_at = Some(now);
        inner.invalidated = false;

        loaded.sort();
        Ok(RefreshReport { loaded, skipped })
    }
}
