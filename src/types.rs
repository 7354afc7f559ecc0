//! Core data model types for ingestion.
//!
//! Two tag enums do different jobs and must not be conflated: [`FormatTag`]
//! is sniffed from a filename and routes a file to a parsing strategy, while
//! [`DatasetFormat`] records what the parsed content turned out to be.
//! A `.json` file can land in any of the non-CSV dataset formats.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SkipReason;

/// Coarse routing tag derived from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// Comma-separated values (`.csv`).
    Csv,
    /// JSON family (`.json`, `.geojson`).
    Json,
    /// Anything else; no handler is registered.
    Other,
}

impl FormatTag {
    /// Sniff a format tag from a filename.
    ///
    /// Matching is on the extension only, case-insensitively. A name without
    /// an extension maps to [`FormatTag::Other`].
    pub fn from_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
                "csv" => FormatTag::Csv,
                "json" | "geojson" => FormatTag::Json,
                _ => FormatTag::Other,
            },
            None => FormatTag::Other,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Csv => f.write_str("csv"),
            FormatTag::Json => f.write_str("json"),
            FormatTag::Other => f.write_str("other"),
        }
    }
}

/// Semantic tag describing the classified content of an ingested file.
///
/// This is a fixed registry; callers extending the supported formats must
/// extend the suffix table and the classification rules consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// Delimited text handed to the row processor.
    Csv,
    /// A GeoJSON `Feature` or `FeatureCollection`.
    GeoJson,
    /// A plain array of row objects.
    Row,
    /// A kepler.gl map bundle (`datasets` + `config` + `info`).
    KeplerGl,
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetFormat::Csv => f.write_str("csv"),
            DatasetFormat::GeoJson => f.write_str("geojson"),
            DatasetFormat::Row => f.write_str("row"),
            DatasetFormat::KeplerGl => f.write_str("keplergl"),
        }
    }
}

/// Processed content plus the semantic format it was classified as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedDataset {
    /// Opaque processor output; the core passes it through untouched.
    pub data: Value,
    /// Which classification rule matched.
    pub format: DatasetFormat,
}

/// Result of running one file through its handler.
///
/// `Skipped` is a product-level drop, not an error: the batch continues and
/// the cache is left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The file produced a dataset.
    Ingested(IngestedDataset),
    /// The file was dropped; the reason names which non-fatal case applied.
    Skipped(SkipReason),
}

/// Descriptive metadata attached to a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    /// Display label; the dispatcher uses the source filename.
    pub label: String,
    /// Classified content format.
    pub format: DatasetFormat,
    /// Caller-supplied dataset id. When absent, payload assembly generates one.
    pub id: Option<String>,
}

/// One successfully processed file. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Classified/processed content.
    pub data: Value,
    /// Entry metadata.
    pub info: EntryInfo,
}

/// Ordered, append-only accumulation of per-file results.
///
/// Under concurrent ingestion the order is completion order, not submission
/// order; downstream logic must treat it as unordered except where payload
/// assembly imposes its own maps-then-datasets ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileCache {
    entries: Vec<CacheEntry>,
}

impl FileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry at the end.
    pub fn push(&mut self, entry: CacheEntry) {
        self.entries.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in arrival order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// Consume the cache, yielding its entries in arrival order.
    pub fn into_entries(self) -> Vec<CacheEntry> {
        self.entries
    }
}

impl FromIterator<CacheEntry> for FileCache {
    fn from_iter<I: IntoIterator<Item = CacheEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FormatTag;

    #[test]
    fn sniffs_known_suffixes() {
        assert_eq!(FormatTag::from_name("points.csv"), FormatTag::Csv);
        assert_eq!(FormatTag::from_name("map.json"), FormatTag::Json);
        assert_eq!(FormatTag::from_name("borders.geojson"), FormatTag::Json);
    }

    #[test]
    fn sniffing_is_case_insensitive() {
        assert_eq!(FormatTag::from_name("UPPER.CSV"), FormatTag::Csv);
        assert_eq!(FormatTag::from_name("Mixed.GeoJSON"), FormatTag::Json);
    }

    #[test]
    fn unknown_or_missing_extensions_map_to_other() {
        assert_eq!(FormatTag::from_name("notes.txt"), FormatTag::Other);
        assert_eq!(FormatTag::from_name("archive.json.gz"), FormatTag::Other);
        assert_eq!(FormatTag::from_name("no_extension"), FormatTag::Other);
    }
}
