//! Application state management
//!
//! The process-scoped session store: created at startup, torn down at exit.
//! Every mutation flows through the cache, pipeline, and selection contracts
//! held here; there are no ambient globals.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::library::LibraryCache;
use crate::ocr::{OcrPipeline, TextExtractor};
use crate::storage::ObjectStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<dyn ObjectStore>,
    cache: LibraryCache,
    extractor: Arc<dyn TextExtractor>,
    pipeline: RwLock<OcrPipeline>,
    /// Name of the entry currently chosen for display; always references a
    /// cached key, or is unset when the cache is empty
    selection: RwLock<Option<String>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let cache = LibraryCache::new(config.cache.ttl_secs);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                cache,
                extractor,
                pipeline: RwLock::new(OcrPipeline::new()),
                selection: RwLock::new(None),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.inner.store.as_ref()
    }

    pub fn cache(&self) -> &LibraryCache {
        &self.inner.cache
    }

    pub fn extractor(&self) -> &dyn TextExtractor {
        self.inner.extractor.as_ref()
    }

    pub fn pipeline(&self) -> &RwLock<OcrPipeline> {
        &self.inner.pipeline
    }

    pub async fn selected(&self) -> Option<String> {
        self.inner.selection.read().await.clone()
    }

    pub async fn select(&self, name: &str) {
        *self.inner.selection.write().await = Some(name.to_string());
    }

    /// Re-validate the selection against the cache, falling back to the
    /// first entry (sorted) when the selected name disappeared, or to unset
    /// when the cache is empty.
    pub async fn reconcile_selection(&self) -> Option<String> {
        let names = self.inner.cache.names().await;
        let mut selection = self.inner.selection.write().await;

        let still_present = selection
            .as_ref()
            .map(|name| names.iter().any(|n| n == name))
            .unwrap_or(false);

        if !still_present {
            *selection = names.first().cloned();
        }
        selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, OcrConfig, ServerConfig, StorageConfig};
    use crate::library::FileContent;
    use crate::ocr::OcrError;
    use crate::storage::memory::MemoryStore;

    use async_trait::async_trait;

    struct NoopExtractor;

    #[async_trait]
    impl TextExtractor for NoopExtractor {
        async fn extract(
            &self,
            _image: &[u8],
            _file_name: &str,
            _language: &str,
        ) -> Result<String, OcrError> {
            Err(OcrError::Service("not under test".into()))
        }
    }

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            storage: StorageConfig {
                endpoint: None,
                region: "us-east-1".into(),
                bucket: "libraries".into(),
                access_key: "test".into(),
                secret_key: "test".into(),
            },
            ocr: OcrConfig {
                endpoint: "http://localhost/parse/image".into(),
                api_key: "test".into(),
                language: "eng".into(),
            },
            cache: CacheConfig { ttl_secs: 300 },
        }
    }

    fn test_state() -> AppState {
        AppState::new(
            test_config(),
            Arc::new(MemoryStore::new()),
            Arc::new(NoopExtractor),
        )
    }

    #[tokio::test]
    async fn selection_reconciles_against_cache() {
        let state = test_state();
        assert_eq!(state.reconcile_selection().await, None);

        state
            .cache()
            .upsert_local("fiction", FileContent::Text { text: "a".into() })
            .await;
        state
            .cache()
            .upsert_local("mystery", FileContent::Text { text: "b".into() })
            .await;

        // Unset selection falls back to the first sorted entry
        assert_eq!(state.reconcile_selection().await.as_deref(), Some("fiction"));

        state.select("mystery").await;
        assert_eq!(state.reconcile_selection().await.as_deref(), Some("mystery"));

        // A selection pointing at a vanished entry is replaced
        state.select("gone").await;
        assert_eq!(state.reconcile_selection().await.as_deref(), Some("fiction"));
    }
}
