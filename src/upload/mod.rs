//! CSV ingestion
//!
//! Accepts a raw byte payload plus a proposed file name, resolves the
//! canonical entry name, writes to the remote store, and updates the cache.
//! Ordering is validate-then-write: a rejected payload is never persisted.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::library::{entry_name, FileContent, LibraryCache, Table};
use crate::storage::ObjectStore;

/// Result of a successful CSV ingestion
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// Canonical entry name (extension stripped)
    pub name: String,
    /// Data rows in the ingested table
    pub rows: usize,
    /// Whether an existing remote entry was overwritten
    pub overwrote: bool,
}

/// Ingest an uploaded CSV file.
///
/// A name collision with an existing remote entry is intentional overwrite:
/// it proceeds and is reported as exactly one warning, never an error nor a
/// second entry under a suffixed name.
pub async fn ingest_csv(
    bytes: &[u8],
    proposed_name: &str,
    cache: &LibraryCache,
    store: &dyn ObjectStore,
) -> Result<UploadOutcome> {
    if proposed_name.is_empty() {
        return Err(AppError::BadRequest("upload has no file name".into()));
    }

    let name = entry_name(proposed_name).to_string();
    let object_key = format!("{name}.csv");

    // Validate before any remote write
    let table = Table::parse(&name, bytes)?;
    let rows = table.row_count();

    // The listing failing here only disables the collision warning; the
    // upload itself still goes through the put below.
    let overwrote = match store.list().await {
        Ok(existing) => existing.iter().any(|f| f == &object_key),
        Err(err) => {
            tracing::debug!(error = %err, "could not check for existing entry");
            false
        }
    };
    if overwrote {
        tracing::warn!(name = %name, "library already exists, overwriting");
    }

    store.upload(&object_key, bytes).await?;

    cache.upsert_local(&name, FileContent::Table(table)).await;
    // Force the next refresh to reconcile against the remote listing
    cache.invalidate().await;

    tracing::info!(name = %name, rows, "uploaded library");

    Ok(UploadOutcome {
        name,
        rows,
        overwrote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    const MYSTERY_5: &[u8] = b"Author,Title,Publication Year\n\
        Christie,And Then There Were None,1939\n\
        Doyle,A Study in Scarlet,1887\n\
        Chandler,The Big Sleep,1939\n\
        Hammett,The Maltese Falcon,1930\n\
        Sayers,Gaudy Night,1935\n";
    const MYSTERY_2: &[u8] = b"Author,Title,Publication Year\n\
        Christie,And Then There Were None,1939\n\
        Doyle,A Study in Scarlet,1887\n";

    #[tokio::test]
    async fn fresh_upload_writes_once_and_updates_cache() {
        let cache = LibraryCache::new(300);
        let store = MemoryStore::new();

        let outcome = ingest_csv(MYSTERY_5, "mystery.csv", &cache, &store)
            .await
            .unwrap();

        assert_eq!(outcome.name, "mystery");
        assert_eq!(outcome.rows, 5);
        assert!(!outcome.overwrote);
        assert_eq!(store.upload_count(), 1);
        assert_eq!(store.get("mystery.csv").unwrap(), MYSTERY_5);
        assert_eq!(cache.get("mystery").await.unwrap().content.row_count(), Some(5));
        assert!(cache.is_stale().await, "upload invalidates the window");
    }

    #[tokio::test]
    async fn re_upload_overwrites_with_warning_not_error() {
        let cache = LibraryCache::new(300);
        let store = MemoryStore::new();

        ingest_csv(MYSTERY_5, "mystery.csv", &cache, &store).await.unwrap();
        let outcome = ingest_csv(MYSTERY_2, "mystery.csv", &cache, &store)
            .await
            .unwrap();

        assert!(outcome.overwrote);
        assert_eq!(outcome.rows, 2);
        // Overwritten under the same key, never a suffixed second entry
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("mystery.csv").unwrap(), MYSTERY_2);
        assert_eq!(cache.get("mystery").await.unwrap().content.row_count(), Some(2));
    }

    #[tokio::test]
    async fn rejected_payload_is_never_persisted() {
        let cache = LibraryCache::new(300);
        let store = MemoryStore::new();

        let err = ingest_csv(b"Author,Title\n", "empty.csv", &cache, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyPayload(_)));

        let err = ingest_csv(b"", "garbage.csv", &cache, &store).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload { .. }));

        assert_eq!(store.upload_count(), 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn listing_failure_does_not_block_upload() {
        let cache = LibraryCache::new(300);
        let store = MemoryStore::new();
        store.fail_listing(true);

        let outcome = ingest_csv(MYSTERY_5, "mystery.csv", &cache, &store)
            .await
            .unwrap();
        assert!(!outcome.overwrote);
        assert_eq!(store.upload_count(), 1);
    }
}
