//! Payload assembly.
//!
//! A pure fold over a cache snapshot: no suspension, no I/O, no state across
//! calls. The output order is mandated by the consumer — every map
//! configuration must be applied before datasets attach to it, so all
//! [`PayloadOp::MapConfig`] operations precede the single trailing
//! [`PayloadOp::DatasetsBatch`], regardless of cache order.

use std::collections::HashSet;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use serde_json::Value;

use crate::types::{DatasetFormat, FileCache};

/// Generated dataset ids are this many alphanumeric characters.
const DATASET_ID_LEN: usize = 8;

/// One operation in the assembled payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PayloadOp {
    /// Apply a map configuration (one per kepler.gl entry, in cache order).
    MapConfig(MapConfigOp),
    /// Attach all plain datasets at once (at most one, always last).
    DatasetsBatch(Vec<PayloadDataset>),
}

/// A map configuration lifted out of a kepler.gl bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapConfigOp {
    /// The bundle's datasets, passed through untouched.
    pub datasets: Value,
    /// The saved map configuration.
    pub config: Value,
    /// Bundle metadata.
    pub info: Value,
    /// True iff the saved config pins no view state, so the consumer should
    /// recenter the map on load.
    pub center_map: bool,
}

/// One dataset in the trailing batch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadDataset {
    /// Unique id within this payload.
    pub id: String,
    /// Display label (the source filename).
    pub label: String,
    /// Classified content format.
    pub format: DatasetFormat,
    /// Processed content, passed through untouched.
    pub data: Value,
}

/// Assemble a cache snapshot into an ordered payload.
///
/// Entries keep their cache order within each partition. Datasets without a
/// supplied id receive a generated one, unique within this call. The trailing
/// datasets operation is appended only when at least one non-map entry
/// existed.
pub fn assemble_payload(cache: &FileCache) -> Vec<PayloadOp> {
    let mut seen_ids: HashSet<String> = cache
        .entries()
        .filter_map(|entry| entry.info.id.clone())
        .collect();

    let mut ops = Vec::new();
    let mut datasets = Vec::new();

    for entry in cache.entries() {
        match entry.info.format {
            DatasetFormat::KeplerGl => {
                ops.push(PayloadOp::MapConfig(map_config_op(&entry.data)));
            }
            format => {
                let id = entry
                    .info
                    .id
                    .clone()
                    .unwrap_or_else(|| generate_dataset_id(&mut seen_ids));
                datasets.push(PayloadDataset {
                    id,
                    label: entry.info.label.clone(),
                    format,
                    data: entry.data.clone(),
                });
            }
        }
    }

    if !datasets.is_empty() {
        ops.push(PayloadOp::DatasetsBatch(datasets));
    }
    ops
}

fn map_config_op(data: &Value) -> MapConfigOp {
    let config = data.get("config").cloned().unwrap_or(Value::Null);
    MapConfigOp {
        datasets: data.get("datasets").cloned().unwrap_or(Value::Null),
        center_map: !has_map_state(&config),
        config,
        info: data.get("info").cloned().unwrap_or(Value::Null),
    }
}

/// A saved config pins a view either at its top level or nested one level
/// down, under its `config` key.
fn has_map_state(config: &Value) -> bool {
    config.get("mapState").is_some()
        || config
            .get("config")
            .and_then(|inner| inner.get("mapState"))
            .is_some()
}

fn generate_dataset_id(seen: &mut HashSet<String>) -> String {
    loop {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(DATASET_ID_LEN)
            .map(char::from)
            .collect();
        if seen.insert(id.clone()) {
            return id;
        }
    }
}
