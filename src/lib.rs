//! Librarium Server
//!
//! A remote-backed library manager: named tabular "libraries" (book-catalog
//! CSVs) live in an S3-compatible bucket, are mirrored into a process-local
//! cache for fast repeated display, and grow through two ingestion paths —
//! direct CSV upload and image-to-text OCR extraction gated behind an
//! explicit human approval step.
//!
//! # Modules
//!
//! - `storage`: remote object store capability and its S3 implementation
//! - `library`: entry types, CSV parsing, and the time-boxed cache
//! - `upload`: CSV ingestion with collision-as-warning overwrite
//! - `ocr`: extraction client and the approval-gated pending-image pipeline
//! - `routes`: the HTTP event surface the view client drives

pub mod config;
pub mod error;
pub mod library;
pub mod ocr;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
