use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use dataset_ingest::blob::{FileBlob, MemoryBlob, PathBlob};
use dataset_ingest::error::{IngestError, SkipReason};
use dataset_ingest::ingestion::{
    IngestContext, IngestObserver, IngestOptions, IngestStats, ingest_file, ingest_files,
    sniff_format,
};
use dataset_ingest::payload::{PayloadOp, assemble_payload};
use dataset_ingest::processors::{PassthroughProcessors, SimpleTableProcessors};
use dataset_ingest::types::{DatasetFormat, FileCache, FormatTag};

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("dataset-ingest-dispatch-{nanos}.{ext}"))
}

fn csv_blob() -> MemoryBlob {
    MemoryBlob::new("points.csv", "lat,lng\n1.0,2.0\n3.0,4.0\n".to_string())
}

#[test]
fn sniff_format_matches_the_suffix_table() {
    assert_eq!(sniff_format("a.csv"), FormatTag::Csv);
    assert_eq!(sniff_format("b.json"), FormatTag::Json);
    assert_eq!(sniff_format("c.geojson"), FormatTag::Json);
    assert_eq!(sniff_format("d.parquet"), FormatTag::Other);
    assert_eq!(sniff_format("no_extension"), FormatTag::Other);
}

#[tokio::test]
async fn other_files_leave_the_cache_unchanged() {
    let seeded = ingest_file(
        &csv_blob(),
        FileCache::new(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(seeded.len(), 1);

    let unknown = MemoryBlob::new("notes.txt", "hello".to_string());
    let after = ingest_file(
        &unknown,
        seeded.clone(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(after, seeded);
}

#[tokio::test]
async fn csv_ingestion_appends_a_labeled_entry() {
    let cache = ingest_file(
        &csv_blob(),
        FileCache::new(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();

    let entry = cache.entries().next().unwrap();
    assert_eq!(entry.info.label, "points.csv");
    assert_eq!(entry.info.format, DatasetFormat::Csv);
    assert_eq!(entry.info.id, None);
    assert_eq!(
        entry.data,
        json!({ "fields": ["lat", "lng"], "rows": [["1.0", "2.0"], ["3.0", "4.0"]] })
    );
}

#[tokio::test]
async fn empty_csv_is_skipped() {
    let empty = MemoryBlob::new("empty.csv", "  \n \n".to_string());
    let cache = ingest_file(
        &empty,
        FileCache::new(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn path_backed_blobs_round_trip_through_the_dispatcher() {
    let path = tmp_file("csv");
    std::fs::write(&path, "name,score\nAda,98.5\n").unwrap();

    let blob = PathBlob::open(&path).await.unwrap();
    assert_eq!(blob.name(), path.file_name().unwrap().to_str().unwrap());

    let cache = ingest_file(
        &blob,
        FileCache::new(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(cache.len(), 1);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn a_vanished_file_is_a_read_failure() {
    let path = tmp_file("csv");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();
    let blob = PathBlob::open(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = ingest_file(
        &blob,
        FileCache::new(),
        &SimpleTableProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IngestError::Io(_)));
}

#[tokio::test]
async fn format_override_beats_the_filename() {
    let blob = MemoryBlob::new("renamed.txt", "a,b\n1,2\n".to_string());
    let options = IngestOptions {
        format: Some(FormatTag::Csv),
        ..Default::default()
    };

    let cache = ingest_file(&blob, FileCache::new(), &SimpleTableProcessors, &options)
        .await
        .unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.entries().next().unwrap().info.format, DatasetFormat::Csv);
}

#[derive(Default)]
struct CountingObserver {
    ingested: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl IngestObserver for CountingObserver {
    fn on_ingested(&self, _ctx: &IngestContext, _stats: IngestStats) {
        self.ingested.fetch_add(1, Ordering::SeqCst);
    }

    fn on_skipped(&self, _ctx: &IngestContext, _reason: SkipReason) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failed(&self, _ctx: &IngestContext, _error: &IngestError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn observer_hooks_fire_once_per_file() {
    let observer = Arc::new(CountingObserver::default());
    let options = IngestOptions {
        observer: Some(observer.clone()),
        ..Default::default()
    };

    let mut cache = FileCache::new();
    cache = ingest_file(&csv_blob(), cache, &SimpleTableProcessors, &options)
        .await
        .unwrap();
    cache = ingest_file(
        &MemoryBlob::new("notes.txt", "hi".to_string()),
        cache,
        &SimpleTableProcessors,
        &options,
    )
    .await
    .unwrap();

    let path = tmp_file("csv");
    std::fs::write(&path, "a\n1\n").unwrap();
    let vanishing = PathBlob::open(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();
    let _ = ingest_file(&vanishing, cache, &SimpleTableProcessors, &options).await;

    assert_eq!(observer.ingested.load(Ordering::SeqCst), 1);
    assert_eq!(observer.skipped.load(Ordering::SeqCst), 1);
    assert_eq!(observer.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batch_ingestion_isolates_per_file_failures() {
    let path = tmp_file("csv");
    std::fs::write(&path, "a\n1\n").unwrap();
    let vanishing = PathBlob::open(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let blobs: Vec<Arc<dyn dataset_ingest::blob::FileBlob>> = vec![
        Arc::new(csv_blob()),
        Arc::new(MemoryBlob::new("notes.txt", "hi".to_string())),
        Arc::new(vanishing),
        Arc::new(MemoryBlob::new(
            "sites.geojson",
            json!({
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 0] }, "properties": {} }
                ]
            })
            .to_string(),
        )),
    ];

    let cache = ingest_files(
        blobs,
        Arc::new(PassthroughProcessors),
        IngestOptions::default(),
    )
    .await;

    assert_eq!(cache.len(), 2);
    let mut labels: Vec<&str> = cache.entries().map(|e| e.info.label.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, ["points.csv", "sites.geojson"]);
}

#[tokio::test]
async fn end_to_end_cache_assembles_into_an_ordered_payload() {
    let map_bundle = MemoryBlob::new(
        "export.json",
        json!({
            "datasets": [{ "data": {}, "info": { "id": "d1" } }],
            "config": { "version": "v1" },
            "info": { "app": "kepler.gl" }
        })
        .to_string(),
    );

    let mut cache = FileCache::new();
    cache = ingest_file(
        &csv_blob(),
        cache,
        &PassthroughProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();
    cache = ingest_file(
        &map_bundle,
        cache,
        &PassthroughProcessors,
        &IngestOptions::default(),
    )
    .await
    .unwrap();

    let ops = assemble_payload(&cache);
    assert_eq!(ops.len(), 2);
    let PayloadOp::MapConfig(map) = &ops[0] else {
        panic!("map config must come first");
    };
    assert!(map.center_map);
    let PayloadOp::DatasetsBatch(datasets) = &ops[1] else {
        panic!("datasets batch must come last");
    };
    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].label, "points.csv");
}
