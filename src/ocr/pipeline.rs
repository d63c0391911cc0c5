//! Approval-gated ingestion pipeline
//!
//! Holds the single pending-image slot. No network call happens before an
//! explicit approval; submission takes the image out of the slot first, so
//! each staged image reaches the extraction service at most once.

use crate::error::{AppError, Result};
use crate::library::{entry_name, FileContent, LibraryCache};
use crate::storage::ObjectStore;

use super::client::TextExtractor;
use super::types::{OcrOutcome, PendingImage, PendingStatus};

/// Pending-image state machine
#[derive(Default)]
pub struct OcrPipeline {
    pending: Option<PendingImage>,
}

impl OcrPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an image for approval.
    ///
    /// While an image is pending, a newly supplied one is rejected rather
    /// than silently replacing it; the caller must cancel first.
    pub fn stage(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        if self.pending.is_some() {
            return Err(AppError::PendingImageBusy);
        }
        if bytes.is_empty() {
            return Err(AppError::BadRequest("image payload is empty".into()));
        }
        tracing::info!(file = %file_name, "image staged, awaiting approval");
        self.pending = Some(PendingImage::new(file_name.to_string(), bytes));
        Ok(())
    }

    /// Approve the staged image for submission. The sole gate before any
    /// external OCR request.
    pub fn approve(&mut self) -> Result<()> {
        match self.pending.as_mut() {
            Some(image) => {
                image.approved = true;
                Ok(())
            }
            None => Err(AppError::NoPendingImage),
        }
    }

    /// Discard the staged image without any OCR call. Returns the file name
    /// that was pending, if any.
    pub fn cancel(&mut self) -> Option<String> {
        self.pending.take().map(|image| {
            tracing::info!(file = %image.file_name, "pending image cancelled");
            image.file_name
        })
    }

    pub fn status(&self) -> PendingStatus {
        match &self.pending {
            None => PendingStatus::Absent,
            Some(image) if image.approved => PendingStatus::Approved {
                file_name: image.file_name.clone(),
            },
            Some(image) => PendingStatus::AwaitingApproval {
                file_name: image.file_name.clone(),
            },
        }
    }

    /// Submit the approved image to the extraction service, persist the
    /// result as a derived text artifact, and merge it into the cache.
    ///
    /// The slot is emptied before the service is called, so the image is
    /// gone on success and failure alike; a failure is surfaced once and
    /// never retried automatically.
    pub async fn submit(
        &mut self,
        extractor: &dyn TextExtractor,
        language: &str,
        store: &dyn ObjectStore,
        cache: &LibraryCache,
    ) -> Result<OcrOutcome> {
        if matches!(self.pending.as_ref(), Some(image) if !image.approved) {
            return Err(AppError::NotApproved);
        }

        // At-most-once: the slot is empty from here on out
        let Some(image) = self.pending.take() else {
            return Err(AppError::NoPendingImage);
        };

        let text = extractor
            .extract(&image.bytes, &image.file_name, language)
            .await?;

        let name = entry_name(&image.file_name).to_string();
        let object_key = format!("{name}.txt");

        store.upload(&object_key, text.as_bytes()).await?;

        cache
            .upsert_local(&name, FileContent::Text { text: text.clone() })
            .await;
        cache.invalidate().await;

        tracing::info!(name = %name, source = %image.file_name, "OCR result ingested");

        Ok(OcrOutcome {
            name,
            object_key,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::client::MockExtractor;
    use crate::storage::memory::MemoryStore;

    const SHELF_JPG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x42];

    #[tokio::test]
    async fn unapproved_image_is_never_submitted() {
        // Scenario: supply shelf.jpg, do not approve
        let mut pipeline = OcrPipeline::new();
        let extractor = MockExtractor::ok("Dune, Herbert");
        let store = MemoryStore::new();
        let cache = LibraryCache::new(300);

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        let err = pipeline
            .submit(&extractor, "eng", &store, &cache)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotApproved));
        assert_eq!(extractor.call_count(), 0);
        assert!(cache.is_empty().await);
        assert_eq!(
            pipeline.status(),
            PendingStatus::AwaitingApproval {
                file_name: "shelf.jpg".into()
            }
        );
    }

    #[tokio::test]
    async fn approved_image_is_extracted_persisted_and_merged() {
        let mut pipeline = OcrPipeline::new();
        let extractor = MockExtractor::ok("Dune, Herbert, 1965");
        let store = MemoryStore::new();
        let cache = LibraryCache::new(300);

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        pipeline.approve().unwrap();
        let outcome = pipeline
            .submit(&extractor, "eng", &store, &cache)
            .await
            .unwrap();

        assert_eq!(outcome.name, "shelf");
        assert_eq!(outcome.object_key, "shelf.txt");
        assert_eq!(extractor.call_count(), 1);
        assert_eq!(store.get("shelf.txt").unwrap(), b"Dune, Herbert, 1965");
        assert!(cache.get("shelf").await.is_some());
        assert_eq!(pipeline.status(), PendingStatus::Absent);
    }

    #[tokio::test]
    async fn at_most_one_submission_per_image() {
        let mut pipeline = OcrPipeline::new();
        let extractor = MockExtractor::ok("text");
        let store = MemoryStore::new();
        let cache = LibraryCache::new(300);

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        pipeline.approve().unwrap();
        pipeline.submit(&extractor, "eng", &store, &cache).await.unwrap();

        // Re-approving with no new image must not trigger a second call
        assert!(matches!(
            pipeline.approve().unwrap_err(),
            AppError::NoPendingImage
        ));
        assert!(matches!(
            pipeline
                .submit(&extractor, "eng", &store, &cache)
                .await
                .unwrap_err(),
            AppError::NoPendingImage
        ));
        assert_eq!(extractor.call_count(), 1);
    }

    #[tokio::test]
    async fn service_failure_clears_slot_and_leaves_cache_unchanged() {
        // Scenario: approve, OCR service reports an error
        let mut pipeline = OcrPipeline::new();
        let extractor = MockExtractor::failing("Invalid API key");
        let store = MemoryStore::new();
        let cache = LibraryCache::new(300);

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        pipeline.approve().unwrap();
        let err = pipeline
            .submit(&extractor, "eng", &store, &cache)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OcrService(_)));
        assert_eq!(extractor.call_count(), 1);
        assert!(cache.is_empty().await);
        assert_eq!(store.upload_count(), 0);
        assert_eq!(pipeline.status(), PendingStatus::Absent);
    }

    #[tokio::test]
    async fn second_image_rejected_while_one_is_pending() {
        let mut pipeline = OcrPipeline::new();

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        pipeline.approve().unwrap();
        let err = pipeline.stage("other.png", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, AppError::PendingImageBusy));

        // The in-flight image and its approval are preserved
        assert_eq!(
            pipeline.status(),
            PendingStatus::Approved {
                file_name: "shelf.jpg".into()
            }
        );
    }

    #[tokio::test]
    async fn cancel_destroys_slot_without_submission() {
        let mut pipeline = OcrPipeline::new();
        let extractor = MockExtractor::ok("text");
        let store = MemoryStore::new();
        let cache = LibraryCache::new(300);

        pipeline.stage("shelf.jpg", SHELF_JPG.to_vec()).unwrap();
        assert_eq!(pipeline.cancel(), Some("shelf.jpg".to_string()));
        assert_eq!(pipeline.status(), PendingStatus::Absent);
        assert_eq!(pipeline.cancel(), None);

        let err = pipeline
            .submit(&extractor, "eng", &store, &cache)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoPendingImage));
        assert_eq!(extractor.call_count(), 0);
    }
}
