//! OCR ingestion
//!
//! Image-to-text extraction gated behind an explicit human approval step.
//! An uploaded image is held pending until approved; only then is it
//! submitted to the external text-extraction service, and the result is
//! persisted as a derived `.txt` artifact and merged into the cache.

mod client;
mod pipeline;
mod types;

pub use client::{OcrSpaceClient, TextExtractor};
pub use pipeline::OcrPipeline;
pub use types::{OcrError, OcrOutcome, PendingStatus};
