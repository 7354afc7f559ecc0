//! `dataset-ingest` is a small library for turning user-supplied file blobs
//! into classified, structured documents ready for dataset construction.
//!
//! The primary entrypoint is [`ingestion::ingest_file`], which sniffs a
//! file's format from its name, parses it with the right strategy, and folds
//! the classified result into a [`types::FileCache`]. A finished cache is
//! turned into an ordered payload with [`payload::assemble_payload`].
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv` — read whole, handed to the row processor
//! - **JSON family**: `.json`, `.geojson` — parsed whole below the size
//!   threshold, or reassembled from streamed parse batches above it
//!
//! Anything else is skipped with a warning; a skipped or malformed file never
//! aborts the rest of a batch.
//!
//! **Document shapes (classified in priority order):**
//!
//! - kepler.gl map bundles (`datasets` + `config` + `info.app == "kepler.gl"`)
//! - arrays of plain row objects
//! - GeoJSON `Feature` / `FeatureCollection` documents
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dataset_ingest::blob::PathBlob;
//! use dataset_ingest::ingestion::{IngestOptions, ingest_file};
//! use dataset_ingest::payload::assemble_payload;
//! use dataset_ingest::processors::SimpleTableProcessors;
//! use dataset_ingest::types::FileCache;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), dataset_ingest::IngestError> {
//! let blob = PathBlob::open("trips.geojson").await?;
//! let cache = ingest_file(
//!     &blob,
//!     FileCache::new(),
//!     &SimpleTableProcessors,
//!     &IngestOptions::default(),
//! )
//! .await?;
//!
//! let payload = assemble_payload(&cache);
//! println!("ops={}", payload.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: dispatch, per-format handlers, classification, streaming
//! - [`blob`]: the borrowed byte-source seam ([`blob::FileBlob`]) and its
//!   path-backed and in-memory implementations
//! - [`processors`]: the semantic-processor boundary and shipped defaults
//! - [`payload`]: ordered payload assembly from a cache snapshot
//! - [`types`]: format tags, cache entries, ingestion outcomes
//! - [`error`]: error and skip taxonomy
//!
//! ## Concurrency
//!
//! Everything suspends cooperatively on the tokio runtime. Files in a batch
//! may be ingested concurrently ([`ingestion::ingest_files`]); the cache then
//! records completion order. Within one file's streaming parse, chunk reads
//! and batch consumption are strictly sequential over bounded channels, so a
//! reassembled document is byte-order deterministic.

pub mod blob;
pub mod error;
pub mod ingestion;
pub mod payload;
pub mod processors;
pub mod types;

pub use error::{IngestError, IngestResult, SkipReason};
