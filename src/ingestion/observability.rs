use std::fmt;
use std::sync::Arc;

use crate::error::{IngestError, SkipReason};
use crate::types::{DatasetFormat, FormatTag};

/// Context about one ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Source filename.
    pub file: String,
    /// Format tag the file was routed by.
    pub format: FormatTag,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Blob size in bytes.
    pub bytes: u64,
    /// Classified content format.
    pub format: DatasetFormat,
}

/// Observer interface for per-file ingestion outcomes.
///
/// Each hook fires at most once per file. Implementors can record metrics,
/// logs, or trigger alerts.
pub trait IngestObserver: Send + Sync {
    /// Called when a file produced a cache entry.
    fn on_ingested(&self, _ctx: &IngestContext, _stats: IngestStats) {}

    /// Called when a file was dropped without failing the batch.
    fn on_skipped(&self, _ctx: &IngestContext, _reason: SkipReason) {}

    /// Called when a file's task failed (read failure).
    fn on_failed(&self, _ctx: &IngestContext, _error: &IngestError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestObserver for CompositeObserver {
    fn on_ingested(&self, ctx: &IngestContext, stats: IngestStats) {
        for o in &self.observers {
            o.on_ingested(ctx, stats);
        }
    }

    fn on_skipped(&self, ctx: &IngestContext, reason: SkipReason) {
        for o in &self.observers {
            o.on_skipped(ctx, reason);
        }
    }

    fn on_failed(&self, ctx: &IngestContext, error: &IngestError) {
        for o in &self.observers {
            o.on_failed(ctx, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{CompositeObserver, IngestContext, IngestObserver, IngestStats};
    use crate::error::SkipReason;
    use crate::types::{DatasetFormat, FormatTag};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl IngestObserver for Counter {
        fn on_ingested(&self, _ctx: &IngestContext, _stats: IngestStats) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn on_skipped(&self, _ctx: &IngestContext, _reason: SkipReason) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn composite_fans_out_to_every_observer() {
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let composite =
            CompositeObserver::new(vec![first.clone() as Arc<dyn IngestObserver>, second.clone()]);

        let ctx = IngestContext {
            file: "points.csv".to_owned(),
            format: FormatTag::Csv,
        };
        composite.on_ingested(
            &ctx,
            IngestStats {
                bytes: 10,
                format: DatasetFormat::Csv,
            },
        );
        composite.on_skipped(&ctx, SkipReason::UnsupportedFileType);

        assert_eq!(first.0.load(Ordering::SeqCst), 2);
        assert_eq!(second.0.load(Ordering::SeqCst), 2);
    }
}
