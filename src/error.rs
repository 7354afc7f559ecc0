use std::fmt;

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type returned by ingestion functions.
///
/// Only genuine failures live here. A file that is merely uninteresting —
/// wrong extension, empty content, unrecognized document shape — is reported
/// as a [`SkipReason`] instead, so that one such file never aborts a batch.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. file not found, a chunk read that failed).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error surfaced by a row processor.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error surfaced by a parse or a processor.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The incremental parse worker died without a verdict.
    #[error("streaming parse worker failed: {0}")]
    Worker(String),

    /// The batch stream ended before the document root was complete.
    #[error("batch stream ended before the document root was complete")]
    TruncatedStream,
}

/// Why a file was dropped from the batch without failing it.
///
/// Each variant maps to one non-fatal case of the ingestion contract; the
/// dispatcher logs exactly one warning per skipped file, naming the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No handler is registered for the sniffed format.
    UnsupportedFileType,
    /// The file was empty, unparsable, or its processor produced no data.
    EmptyOrUnparsable,
    /// The document parsed but matched no recognized shape.
    UnsupportedDocumentShape,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedFileType => f.write_str("unsupported file type"),
            SkipReason::EmptyOrUnparsable => f.write_str("empty or unparsable content"),
            SkipReason::UnsupportedDocumentShape => f.write_str("unsupported document shape"),
        }
    }
}
