//! CSV ingestion implementation.
//!
//! The file is read whole as text and handed to the external row processor;
//! this crate never interprets the delimited grammar itself.

use crate::blob::FileBlob;
use crate::error::{IngestResult, SkipReason};
use crate::processors::DatasetProcessors;
use crate::types::{DatasetFormat, IngestOutcome, IngestedDataset};

/// Ingest a delimited-text blob.
///
/// Empty or whitespace-only content is a skip; a read failure rejects and is
/// scoped to this file's task.
pub async fn ingest_csv(
    blob: &dyn FileBlob,
    processors: &dyn DatasetProcessors,
) -> IngestResult<IngestOutcome> {
    let text = blob.read_text().await?;
    if text.trim().is_empty() {
        return Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable));
    }

    match processors.process_csv(&text) {
        Ok(data) => Ok(IngestOutcome::Ingested(IngestedDataset {
            data,
            format: DatasetFormat::Csv,
        })),
        Err(_) => Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable)),
    }
}
