use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use equipment_stats::Summary;
use equipment_store::{
    BlobStore, DatasetStore, FileReference, FsBlobStore, InMemoryBlobStore, StoreError, RETENTION,
};
use sqlx::sqlite::SqlitePoolOptions;

fn summary(n: u64) -> Summary {
    Summary {
        total_count: n,
        avg_flowrate: n as f64,
        avg_pressure: 1.5,
        avg_temperature: 20.25,
        type_distribution: BTreeMap::from([("Pump".to_string(), n)]),
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

async fn store_with(blobs: Arc<dyn BlobStore>) -> DatasetStore {
    DatasetStore::in_memory(blobs).await.unwrap()
}

#[tokio::test]
async fn test_empty_store() {
    let store = store_with(Arc::new(InMemoryBlobStore::new())).await;

    assert!(store.latest().await.unwrap().is_none());
    assert!(store.history(5).await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sixth_add_evicts_earliest_and_its_blob() {
    let blobs = InMemoryBlobStore::new();
    let store = store_with(Arc::new(blobs.clone())).await;

    let mut added = Vec::new();
    for i in 0..6u64 {
        let file = blobs.put(&format!("f{i}.csv"), b"data").await.unwrap();
        let rec = store.add_at(&summary(i + 1), &file, t0() + Duration::seconds(i as i64)).await.unwrap();
        added.push(rec);
    }

    assert_eq!(store.count().await.unwrap(), RETENTION);
    assert!(store.get(added[0].id).await.unwrap().is_none());
    assert!(!blobs.exists(&added[0].file).await.unwrap());
    assert_eq!(blobs.len().await, 5);

    for rec in &added[1..] {
        assert_eq!(store.get(rec.id).await.unwrap().as_ref(), Some(rec));
    }
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let blobs = InMemoryBlobStore::new();
    let store = store_with(Arc::new(blobs.clone())).await;

    // inserted out of chronological order
    for (i, offset) in [3i64, 0, 4, 1, 2, 6, 5].into_iter().enumerate() {
        let file = blobs.put(&format!("f{i}.csv"), b"data").await.unwrap();
        store.add_at(&summary(1), &file, t0() + Duration::minutes(offset)).await.unwrap();
    }

    let history = store.history(5).await.unwrap();
    assert_eq!(history.len(), 5);
    for pair in history.windows(2) {
        assert!(pair[0].upload_date > pair[1].upload_date);
    }
    assert_eq!(history[0].upload_date, t0() + Duration::minutes(6));
    assert_eq!(history[4].upload_date, t0() + Duration::minutes(2));

    let latest = store.latest().await.unwrap().unwrap();
    assert_eq!(latest, history[0]);

    assert_eq!(store.history(2).await.unwrap().len(), 2);
    assert_eq!(store.history(0).await.unwrap().len(), 1);
    assert_eq!(store.history(50).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_equal_timestamps_evict_lowest_id() {
    let blobs = InMemoryBlobStore::new();
    let store = store_with(Arc::new(blobs.clone())).await;

    let mut ids = Vec::new();
    for i in 0..6 {
        let file = blobs.put(&format!("f{i}.csv"), b"data").await.unwrap();
        ids.push(store.add_at(&summary(1), &file, t0()).await.unwrap().id);
    }

    assert!(store.get(ids[0]).await.unwrap().is_none());
    let history: Vec<i64> = store.history(5).await.unwrap().iter().map(|r| r.id).collect();
    let mut expected = ids[1..].to_vec();
    expected.reverse();
    assert_eq!(history, expected);
}

struct FailingDeletes(InMemoryBlobStore);

#[async_trait]
impl BlobStore for FailingDeletes {
    async fn put(&self, name: &str, bytes: &[u8]) -> equipment_store::Result<FileReference> {
        self.0.put(name, bytes).await
    }

    async fn delete(&self, _file: &FileReference) -> equipment_store::Result<()> {
        Err(StoreError::Blob("disk on fire".into()))
    }

    async fn exists(&self, file: &FileReference) -> equipment_store::Result<bool> {
        self.0.exists(file).await
    }
}

#[tokio::test]
async fn test_blob_delete_failure_does_not_fail_add() {
    let blobs = Arc::new(FailingDeletes(InMemoryBlobStore::new()));
    let store = store_with(blobs.clone()).await;

    for i in 0..7 {
        let file = blobs.put(&format!("f{i}.csv"), b"data").await.unwrap();
        store.add_at(&summary(1), &file, t0() + Duration::seconds(i)).await.unwrap();
    }

    assert_eq!(store.count().await.unwrap(), RETENTION);
}

#[tokio::test]
async fn test_ingest_writes_blob_and_record() {
    let blobs = InMemoryBlobStore::new();
    let store = store_with(Arc::new(blobs.clone())).await;

    let rec = store.ingest(b"raw,csv\n", &summary(3)).await.unwrap();

    assert!(rec.file.name.ends_with(".csv"));
    assert_eq!(rec.file.size, 8);
    assert_eq!(blobs.get(&rec.file.name).await.unwrap(), b"raw,csv\n");
    assert_eq!(store.latest().await.unwrap().unwrap().summary, summary(3));
}

#[tokio::test]
async fn test_concurrent_adds_never_exceed_retention() {
    let blobs = InMemoryBlobStore::new();
    let store = Arc::new(store_with(Arc::new(blobs.clone())).await);

    let mut tasks = Vec::new();
    for i in 0..12u64 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move { store.ingest(b"x", &summary(i + 1)).await }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(store.count().await.unwrap(), RETENTION);
    assert_eq!(blobs.len().await, RETENTION);
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("meta.db").display());
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(dir.path().join("datasets")));

    let rec = {
        let store = DatasetStore::connect(&url, blobs.clone()).await.unwrap();
        let rec = store.ingest(b"a,b\n", &summary(2)).await.unwrap();
        store.close().await;
        rec
    };

    let store = DatasetStore::connect(&url, blobs.clone()).await.unwrap();
    assert_eq!(store.latest().await.unwrap(), Some(rec.clone()));
    assert!(blobs.exists(&rec.file).await.unwrap());
}

#[tokio::test]
async fn test_non_finite_summary_is_refused() {
    let blobs = InMemoryBlobStore::new();
    let store = store_with(Arc::new(blobs.clone())).await;

    let mut bad = summary(1);
    bad.avg_pressure = f64::INFINITY;
    let err = store.ingest(b"x", &bad).await.unwrap_err();

    assert!(matches!(err, StoreError::InvalidSummary(_)), "{err:?}");
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(blobs.len().await, 0);
}

#[tokio::test]
async fn test_unreadable_summary_does_not_block_eviction() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let blobs = InMemoryBlobStore::new();
    let store = DatasetStore::from_pool(pool.clone(), Arc::new(blobs.clone())).await.unwrap();

    let file = blobs.put("broken.csv", b"data").await.unwrap();
    sqlx::query(
        "INSERT INTO datasets (upload_date_us, summary, file_name, file_size, file_hash) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(t0().timestamp_micros())
    .bind(r#"{"total_count":1,"avg_flowrate":null}"#)
    .bind(&file.name)
    .bind(file.size as i64)
    .bind(hex::encode(file.content_hash))
    .execute(&pool)
    .await
    .unwrap();

    assert!(matches!(store.latest().await, Err(StoreError::Corrupt { .. })));

    for i in 1..=RETENTION as i64 {
        let f = blobs.put(&format!("f{i}.csv"), b"data").await.unwrap();
        store.add_at(&summary(1), &f, t0() + Duration::seconds(i)).await.unwrap();
    }

    assert_eq!(store.count().await.unwrap(), RETENTION);
    assert!(!blobs.exists(&file).await.unwrap());
    assert_eq!(store.history(RETENTION).await.unwrap().len(), RETENTION);
}
