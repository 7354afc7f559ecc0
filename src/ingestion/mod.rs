//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_file`] (from [`dispatch`]) which:
//!
//! - sniffs the format from the filename (or you can override it via
//!   [`IngestOptions`])
//! - routes to the CSV or JSON handler, picking whole-document or streaming
//!   parsing by file size
//! - folds the classified result into a [`crate::types::FileCache`]
//!
//! The pieces are also available individually:
//! - [`csv`] / [`json`]: per-format handlers
//! - [`classify`]: document shape classification
//! - [`stream`]: the chunked batch parse machinery for very large JSON
//! - [`observability`]: per-file outcome hooks

pub mod classify;
pub mod csv;
pub mod dispatch;
pub mod json;
pub mod observability;
pub mod stream;

pub use classify::{DocumentShape, classify};
pub use dispatch::{IngestOptions, ingest_file, ingest_files, sniff_format};
pub use json::STREAMING_THRESHOLD_BYTES;
pub use observability::{CompositeObserver, IngestContext, IngestObserver, IngestStats};
pub use stream::{
    BulkKey, DEFAULT_CHUNK_BYTES, ParseBatch, RootContainer, assemble_batches, parse_in_batches,
};
