//! JSON ingestion implementation.
//!
//! Strategy selection happens here: documents below the size threshold are
//! read whole and parsed once; anything at or above it goes through the
//! chunked streaming path in [`super::stream`]. Both paths feed the same
//! classifier, so they produce identical results for the same bytes.

use serde_json::Value;
use tracing::debug;

use crate::blob::FileBlob;
use crate::error::{IngestError, IngestResult, SkipReason};
use crate::ingestion::classify::{DocumentShape, classify};
use crate::ingestion::dispatch::IngestOptions;
use crate::ingestion::stream;
use crate::processors::DatasetProcessors;
use crate::types::{DatasetFormat, IngestOutcome, IngestedDataset};

/// File size at which ingestion switches to the streaming path. Keeps very
/// large documents under platform string-length limits and bounds peak
/// memory.
pub const STREAMING_THRESHOLD_BYTES: u64 = 250 * 1024 * 1024;

/// Ingest a JSON-family blob.
///
/// Unparsable content is a skip, not a failure; only a read error rejects.
pub async fn ingest_json(
    blob: &dyn FileBlob,
    processors: &dyn DatasetProcessors,
    options: &IngestOptions,
) -> IngestResult<IngestOutcome> {
    let document = if blob.size() >= options.streaming_threshold {
        debug!(file = blob.name(), size = blob.size(), "streaming parse");
        match stream::parse_in_batches(blob, options.chunk_bytes).await {
            Ok(document) => document,
            Err(IngestError::Json(_)) => {
                return Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable));
            }
            Err(error) => return Err(error),
        }
    } else {
        let text = blob.read_text().await?;
        if text.trim().is_empty() {
            return Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable));
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(document) => document,
            Err(_) => return Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable)),
        }
    };

    classify_and_process(document, processors)
}

fn classify_and_process(
    document: Value,
    processors: &dyn DatasetProcessors,
) -> IngestResult<IngestOutcome> {
    let (processed, format) = match classify(&document) {
        DocumentShape::KeplerMap => (
            processors.process_keplergl_map(document),
            DatasetFormat::KeplerGl,
        ),
        DocumentShape::RowArray => (processors.process_row_objects(document), DatasetFormat::Row),
        DocumentShape::Feature | DocumentShape::FeatureCollection => {
            (processors.process_geojson(document), DatasetFormat::GeoJson)
        }
        DocumentShape::Unsupported => {
            return Ok(IngestOutcome::Skipped(SkipReason::UnsupportedDocumentShape));
        }
    };

    match processed {
        Ok(data) => Ok(IngestOutcome::Ingested(IngestedDataset { data, format })),
        Err(_) => Ok(IngestOutcome::Skipped(SkipReason::EmptyOrUnparsable)),
    }
}
