//! Library data model and cache
//!
//! A "library" is a named tabular entry (book-catalog CSV) living in the
//! remote bucket; OCR output coexists in the same namespace as text entries.
//! The cache mirrors the bucket contents for fast repeated display.

mod cache;
mod types;

pub use cache::{LibraryCache, RefreshReport, SkippedFile};
pub use types::{entry_name, CacheEntry, FileContent, FileKind, Table};
