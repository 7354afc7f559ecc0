//! Unified ingestion entrypoints.
//!
//! [`ingest_file`] routes one blob by its sniffed [`FormatTag`] and folds the
//! result into a cache. Every non-fatal condition — unsupported extension,
//! empty content, unrecognized document shape — leaves the cache unchanged
//! and settles the call exactly once; only a read failure rejects, and it is
//! scoped to that one file. [`ingest_files`] runs a whole batch concurrently
//! and absorbs per-file failures so the rest of the batch survives.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use crate::blob::FileBlob;
use crate::error::{IngestResult, SkipReason};
use crate::ingestion::csv::ingest_csv;
use crate::ingestion::json::{STREAMING_THRESHOLD_BYTES, ingest_json};
use crate::ingestion::observability::{IngestContext, IngestObserver, IngestStats};
use crate::ingestion::stream::DEFAULT_CHUNK_BYTES;
use crate::processors::DatasetProcessors;
use crate::types::{CacheEntry, EntryInfo, FileCache, FormatTag, IngestOutcome};

/// Sniff a format tag from a filename. See [`FormatTag::from_name`].
pub fn sniff_format(name: &str) -> FormatTag {
    FormatTag::from_name(name)
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestOptions {
    /// If `None`, the format is sniffed from the filename.
    pub format: Option<FormatTag>,
    /// File size at which JSON ingestion switches to the streaming path.
    pub streaming_threshold: u64,
    /// Slice size for chunked reads on the streaming path.
    pub chunk_bytes: u64,
    /// Optional observer for per-file outcomes.
    pub observer: Option<Arc<dyn IngestObserver>>,
}

impl fmt::Debug for IngestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestOptions")
            .field("format", &self.format)
            .field("streaming_threshold", &self.streaming_threshold)
            .field("chunk_bytes", &self.chunk_bytes)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            format: None,
            streaming_threshold: STREAMING_THRESHOLD_BYTES,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            observer: None,
        }
    }
}

/// Ingest one file and fold the result into `cache`.
///
/// On success the returned cache carries one new entry labeled with the
/// file's name; on any skip it is returned unchanged. The returned future
/// settles exactly once per invocation.
pub async fn ingest_file(
    blob: &dyn FileBlob,
    cache: FileCache,
    processors: &dyn DatasetProcessors,
    options: &IngestOptions,
) -> IngestResult<FileCache> {
    let ctx = context_for(blob, options);
    match run_handler(blob, &ctx, processors, options).await {
        Ok(outcome) => Ok(commit(cache, &ctx, blob.size(), outcome, options)),
        Err(error) => {
            if let Some(observer) = options.observer.as_ref() {
                observer.on_failed(&ctx, &error);
            }
            Err(error)
        }
    }
}

/// Ingest a batch of files as independent concurrent tasks.
///
/// Cache order is completion order, a race outcome. A file whose task fails
/// is logged and dropped; the remaining files still land in the cache.
pub async fn ingest_files(
    blobs: Vec<Arc<dyn FileBlob>>,
    processors: Arc<dyn DatasetProcessors>,
    options: IngestOptions,
) -> FileCache {
    let mut tasks = JoinSet::new();
    for blob in blobs {
        let processors = Arc::clone(&processors);
        let options = options.clone();
        tasks.spawn(async move {
            let ctx = context_for(blob.as_ref(), &options);
            let bytes = blob.size();
            let outcome = run_handler(blob.as_ref(), &ctx, processors.as_ref(), &options).await;
            (ctx, bytes, outcome)
        });
    }

    let mut cache = FileCache::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((ctx, bytes, Ok(outcome))) => {
                cache = commit(cache, &ctx, bytes, outcome, &options);
            }
            Ok((ctx, _, Err(error))) => {
                warn!(file = %ctx.file, %error, "file ingestion failed");
                if let Some(observer) = options.observer.as_ref() {
                    observer.on_failed(&ctx, &error);
                }
            }
            Err(join_error) => {
                warn!(%join_error, "ingestion task did not complete");
            }
        }
    }
    cache
}

fn context_for(blob: &dyn FileBlob, options: &IngestOptions) -> IngestContext {
    IngestContext {
        file: blob.name().to_owned(),
        format: options
            .format
            .unwrap_or_else(|| FormatTag::from_name(blob.name())),
    }
}

async fn run_handler(
    blob: &dyn FileBlob,
    ctx: &IngestContext,
    processors: &dyn DatasetProcessors,
    options: &IngestOptions,
) -> IngestResult<IngestOutcome> {
    match ctx.format {
        FormatTag::Csv => ingest_csv(blob, processors).await,
        FormatTag::Json => ingest_json(blob, processors, options).await,
        FormatTag::Other => Ok(IngestOutcome::Skipped(SkipReason::UnsupportedFileType)),
    }
}

fn commit(
    mut cache: FileCache,
    ctx: &IngestContext,
    bytes: u64,
    outcome: IngestOutcome,
    options: &IngestOptions,
) -> FileCache {
    match outcome {
        IngestOutcome::Ingested(dataset) => {
            if let Some(observer) = options.observer.as_ref() {
                observer.on_ingested(
                    ctx,
                    IngestStats {
                        bytes,
                        format: dataset.format,
                    },
                );
            }
            cache.push(CacheEntry {
                data: dataset.data,
                info: EntryInfo {
                    label: ctx.file.clone(),
                    format: dataset.format,
                    id: None,
                },
            });
        }
        IngestOutcome::Skipped(reason) => {
            warn!(file = %ctx.file, %reason, "file skipped");
            if let Some(observer) = options.observer.as_ref() {
                observer.on_skipped(ctx, reason);
            }
        }
    }
    cache
}
