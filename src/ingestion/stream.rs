//! Streaming ingestion for very large JSON documents.
//!
//! Above the size threshold a document is never materialized as one string.
//! Three stages cooperate over bounded channels instead:
//!
//! 1. a chunk pump reads fixed-size byte slices in offset order;
//! 2. a parse worker on the blocking pool feeds those chunks to
//!    `serde_json`'s reader-driven deserializer and emits [`ParseBatch`]
//!    values — bulk array elements in order, then one terminal
//!    [`ParseBatch::RootComplete`];
//! 3. [`assemble_batches`] folds the batches back into a single document.
//!
//! Both channels are bounded to capacity 1, so at most one chunk and one
//! batch are in flight and arrival order equals byte-offset order.

use std::fmt;
use std::io::{self, Read};

use bytes::{Buf, Bytes};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::blob::FileBlob;
use crate::error::{IngestError, IngestResult};

/// Default chunk size for slice reads: the largest chunk that keeps the
/// cooperative loop responsive.
pub const DEFAULT_CHUNK_BYTES: u64 = 1024 * 1024;

/// Bulk array elements carried per data batch.
const ELEMENTS_PER_BATCH: usize = 4096;

/// One unit of incremental parse progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseBatch {
    /// A run of bulk array elements, in document order.
    Data(Vec<Value>),
    /// Terminal batch, emitted exactly once after all data batches.
    RootComplete(RootContainer),
}

/// The reconstructed top-level skeleton, discriminated by the very first
/// parse event rather than by inspecting accumulated data.
#[derive(Debug, Clone, PartialEq)]
pub enum RootContainer {
    /// The document was a bare top-level array; its elements arrived as data
    /// batches and the accumulator *is* the document.
    Array,
    /// The document was an object. `fields` holds every non-bulk property
    /// verbatim; `bulk` names the property whose elements were streamed out.
    Object {
        /// Non-bulk properties of the top-level object.
        fields: Map<String, Value>,
        /// Which bulk property was streamed, if any.
        bulk: Option<BulkKey>,
    },
    /// The document was a single scalar.
    Scalar(Value),
}

/// The object properties whose contents are streamed instead of buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKey {
    /// A GeoJSON feature collection's `features` array.
    Features,
    /// A kepler.gl map bundle's `datasets` array.
    Datasets,
}

impl BulkKey {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "features" => Some(BulkKey::Features),
            "datasets" => Some(BulkKey::Datasets),
            _ => None,
        }
    }

    /// The JSON property name this key streams.
    pub fn as_str(self) -> &'static str {
        match self {
            BulkKey::Features => "features",
            BulkKey::Datasets => "datasets",
        }
    }
}

/// Parse a blob in fixed-size chunks and reassemble the document.
///
/// Returns the same value a whole-document `serde_json::from_str` would,
/// for any chunk partition of the same bytes. Read failures surface as
/// [`IngestError::Io`]; malformed JSON as [`IngestError::Json`].
pub async fn parse_in_batches(blob: &dyn FileBlob, chunk_bytes: u64) -> IngestResult<Value> {
    let chunk_bytes = chunk_bytes.max(1);
    let (chunk_tx, chunk_rx) = mpsc::channel::<io::Result<Bytes>>(1);
    let (batch_tx, batch_rx) = mpsc::channel::<ParseBatch>(1);

    let worker = tokio::task::spawn_blocking(move || run_parse_worker(chunk_rx, batch_tx));

    // The pump shares this task with the assembler; the bounded channels keep
    // the three stages in lockstep.
    let ((), assembled) = tokio::join!(
        pump_chunks(blob, chunk_tx, chunk_bytes),
        assemble_batches(batch_rx),
    );

    match worker.await {
        Ok(Ok(())) => assembled,
        Ok(Err(error)) => Err(split_parse_error(error)),
        Err(join_error) => Err(IngestError::Worker(join_error.to_string())),
    }
}

/// Reconstruct one document from an ordered batch stream.
///
/// Data batch elements are concatenated in arrival order, never reordered or
/// deduplicated. The terminal [`ParseBatch::RootComplete`] decides the final
/// shape; a channel that closes without one is a truncated stream.
pub async fn assemble_batches(mut rx: mpsc::Receiver<ParseBatch>) -> IngestResult<Value> {
    let mut acc: Vec<Value> = Vec::new();
    while let Some(batch) = rx.recv().await {
        match batch {
            ParseBatch::Data(mut elements) => acc.append(&mut elements),
            ParseBatch::RootComplete(root) => return Ok(reassemble(root, acc)),
        }
    }
    Err(IngestError::TruncatedStream)
}

fn reassemble(root: RootContainer, acc: Vec<Value>) -> Value {
    match root {
        RootContainer::Array => Value::Array(acc),
        RootContainer::Scalar(value) => value,
        RootContainer::Object { mut fields, bulk } => {
            if let Some(key) = bulk {
                fields.insert(key.as_str().to_owned(), Value::Array(acc));
            }
            Value::Object(fields)
        }
    }
}

async fn pump_chunks(blob: &dyn FileBlob, tx: mpsc::Sender<io::Result<Bytes>>, chunk_bytes: u64) {
    let size = blob.size();
    let mut offset = 0u64;
    while offset < size {
        let end = (offset + chunk_bytes).min(size);
        let chunk = blob.slice(offset, end).await;
        let failed = chunk.is_err();
        // A closed receiver means the worker already settled; stop reading.
        if tx.send(chunk).await.is_err() || failed {
            return;
        }
        offset = end;
    }
}

fn run_parse_worker(
    chunk_rx: mpsc::Receiver<io::Result<Bytes>>,
    batch_tx: mpsc::Sender<ParseBatch>,
) -> Result<(), serde_json::Error> {
    let reader = ChunkStreamReader::new(chunk_rx);
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut sink = BatchSink::new(batch_tx);

    let root = RootSeed { sink: &mut sink }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    sink.finish(root);
    Ok(())
}

fn split_parse_error(error: serde_json::Error) -> IngestError {
    if error.classify() == serde_json::error::Category::Io {
        IngestError::Io(io::Error::other(error))
    } else {
        IngestError::Json(error)
    }
}

/// Blocking `Read` adapter over the chunk channel.
struct ChunkStreamReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkStreamReader {
    fn new(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkStreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(error)) => return Err(error),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

/// Accumulates bulk elements and flushes them downstream in bounded batches.
struct BatchSink {
    tx: mpsc::Sender<ParseBatch>,
    pending: Vec<Value>,
}

impl BatchSink {
    fn new(tx: mpsc::Sender<ParseBatch>) -> Self {
        Self {
            tx,
            pending: Vec::new(),
        }
    }

    fn push<E: de::Error>(&mut self, element: Value) -> Result<(), E> {
        self.pending.push(element);
        if self.pending.len() >= ELEMENTS_PER_BATCH {
            self.flush::<E>()?;
        }
        Ok(())
    }

    fn flush<E: de::Error>(&mut self) -> Result<(), E> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let elements = std::mem::take(&mut self.pending);
        self.tx
            .blocking_send(ParseBatch::Data(elements))
            .map_err(|_| E::custom("batch receiver closed"))
    }

    fn finish(mut self, root: RootContainer) {
        if !self.pending.is_empty() {
            let elements = std::mem::take(&mut self.pending);
            let _ = self.tx.blocking_send(ParseBatch::Data(elements));
        }
        let _ = self.tx.blocking_send(ParseBatch::RootComplete(root));
    }
}

/// Deserializes the top-level value, streaming bulk arrays through the sink.
struct RootSeed<'a> {
    sink: &'a mut BatchSink,
}

impl<'de> DeserializeSeed<'de> for RootSeed<'_> {
    type Value = RootContainer;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(RootVisitor { sink: self.sink })
    }
}

struct RootVisitor<'a> {
    sink: &'a mut BatchSink,
}

impl<'de> Visitor<'de> for RootVisitor<'_> {
    type Value = RootContainer;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a top-level json value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::String(v.to_owned())))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RootContainer::Scalar(Value::Null))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<Value>()? {
            self.sink.push(element)?;
        }
        Ok(RootContainer::Array)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = Map::new();
        let mut bulk = None;
        while let Some(key) = map.next_key::<String>()? {
            match (bulk, BulkKey::from_name(&key)) {
                // Only the first bulk property is streamed; any later one is
                // buffered like an ordinary field.
                (None, Some(bulk_key)) => {
                    match map.next_value_seed(BulkSeed {
                        sink: &mut *self.sink,
                    })? {
                        BulkOutcome::Streamed => bulk = Some(bulk_key),
                        BulkOutcome::Inline(value) => {
                            fields.insert(key, value);
                        }
                    }
                }
                _ => {
                    fields.insert(key, map.next_value::<Value>()?);
                }
            }
        }
        Ok(RootContainer::Object { fields, bulk })
    }
}

enum BulkOutcome {
    /// The value was an array; its elements went through the sink.
    Streamed,
    /// The value was not an array and was buffered whole.
    Inline(Value),
}

struct BulkSeed<'a> {
    sink: &'a mut BatchSink,
}

impl<'de> DeserializeSeed<'de> for BulkSeed<'_> {
    type Value = BulkOutcome;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(BulkVisitor { sink: self.sink })
    }
}

struct BulkVisitor<'a> {
    sink: &'a mut BatchSink,
}

impl<'de> Visitor<'de> for BulkVisitor<'_> {
    type Value = BulkOutcome;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a json value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::String(v.to_owned())))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BulkOutcome::Inline(Value::Null))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<Value>()? {
            self.sink.push(element)?;
        }
        Ok(BulkOutcome::Streamed)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Map::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            object.insert(key, value);
        }
        Ok(BulkOutcome::Inline(Value::Object(object)))
    }
}
