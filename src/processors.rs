//! The collaborator boundary for semantic content processing.
//!
//! The pipeline classifies content and routes it, but it never interprets
//! rows, features, or map configurations itself — that is the job of a
//! [`DatasetProcessors`] implementation supplied explicitly at the call site.
//! Two implementations ship with the crate:
//!
//! - [`PassthroughProcessors`]: returns every input unchanged, for hosts that
//!   do their own downstream processing.
//! - [`SimpleTableProcessors`]: tabularizes CSV text and row-object arrays
//!   into a small `{fields, rows}` document, useful on its own and in tests.

use serde_json::{Map, Value, json};

use crate::error::IngestResult;

/// Semantic processors invoked once per classified document.
///
/// Outputs are opaque to the core: whatever a method returns is stored in the
/// cache entry untouched. A processor failure is absorbed by the caller as a
/// skip, never as a batch failure.
pub trait DatasetProcessors: Send + Sync {
    /// Process raw delimited text.
    fn process_csv(&self, raw: &str) -> IngestResult<Value>;

    /// Process an array of plain row objects.
    fn process_row_objects(&self, rows: Value) -> IngestResult<Value>;

    /// Process a GeoJSON `Feature` or `FeatureCollection` document.
    fn process_geojson(&self, doc: Value) -> IngestResult<Value>;

    /// Process a kepler.gl map bundle (`datasets` + `config` + `info`).
    fn process_keplergl_map(&self, doc: Value) -> IngestResult<Value>;
}

/// Hands every document through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughProcessors;

impl DatasetProcessors for PassthroughProcessors {
    fn process_csv(&self, raw: &str) -> IngestResult<Value> {
        Ok(Value::String(raw.to_owned()))
    }

    fn process_row_objects(&self, rows: Value) -> IngestResult<Value> {
        Ok(rows)
    }

    fn process_geojson(&self, doc: Value) -> IngestResult<Value> {
        Ok(doc)
    }

    fn process_keplergl_map(&self, doc: Value) -> IngestResult<Value> {
        Ok(doc)
    }
}

/// Tabularizes delimited text and row objects into `{fields, rows}`.
///
/// CSV is parsed with the `csv` crate (headers required); row objects take
/// their field list from the first object's keys. Values are kept as-is with
/// no type inference. GeoJSON and map bundles pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTableProcessors;

impl DatasetProcessors for SimpleTableProcessors {
    fn process_csv(&self, raw: &str) -> IngestResult<Value> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(raw.as_bytes());

        let fields: Vec<Value> = reader
            .headers()?
            .iter()
            .map(|h| Value::String(h.to_owned()))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(Value::Array(
                record.iter().map(|v| Value::String(v.to_owned())).collect(),
            ));
        }

        Ok(json!({ "fields": fields, "rows": rows }))
    }

    fn process_row_objects(&self, rows: Value) -> IngestResult<Value> {
        let items = match rows {
            Value::Array(items) => items,
            other => return Ok(other),
        };

        let fields: Vec<String> = items
            .first()
            .and_then(Value::as_object)
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();

        let table_rows: Vec<Value> = items
            .iter()
            .map(|item| {
                let obj = item.as_object();
                Value::Array(
                    fields
                        .iter()
                        .map(|f| pick(obj, f))
                        .collect(),
                )
            })
            .collect();

        Ok(json!({ "fields": fields, "rows": table_rows }))
    }

    fn process_geojson(&self, doc: Value) -> IngestResult<Value> {
        Ok(doc)
    }

    fn process_keplergl_map(&self, doc: Value) -> IngestResult<Value> {
        Ok(doc)
    }
}

fn pick(obj: Option<&Map<String, Value>>, field: &str) -> Value {
    obj.and_then(|o| o.get(field)).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DatasetProcessors, SimpleTableProcessors};

    #[test]
    fn csv_text_becomes_a_table() {
        let out = SimpleTableProcessors
            .process_csv("a,b\n1,2\n3,4\n")
            .unwrap();
        assert_eq!(
            out,
            json!({ "fields": ["a", "b"], "rows": [["1", "2"], ["3", "4"]] })
        );
    }

    #[test]
    fn row_objects_take_fields_from_the_first_object() {
        let rows = json!([{ "a": 1, "b": "x" }, { "a": 2 }]);
        let out = SimpleTableProcessors.process_row_objects(rows).unwrap();
        assert_eq!(
            out,
            json!({ "fields": ["a", "b"], "rows": [[1, "x"], [2, null]] })
        );
    }

    #[test]
    fn malformed_csv_is_an_error() {
        // Unclosed quote inside a quoted field.
        let err = SimpleTableProcessors.process_csv("a,b\n\"oops,2\n3,4");
        assert!(err.is_err());
    }
}
