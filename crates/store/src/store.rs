use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use equipment_stats::Summary;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::schema::{DatasetRow, EvictionRow, DATASET_COLUMNS};
use crate::{BlobStore, DatasetRecord, FileReference, Result, StoreError};

/// Number of uploads kept.
pub const RETENTION: usize = 5;

pub struct DatasetStore {
    pool: SqlitePool,
    blobs: Arc<dyn BlobStore>,
    retention: usize,
    // serializes insert+evict across tasks
    write_lock: Mutex<()>,
}

impl DatasetStore {
    /// Open (or create) the database at `url` and run migrations.
    pub async fn connect(url: &str, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // every connection to :memory: is its own database, so keep exactly one alive
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?
        };

        Self::from_pool(pool, blobs).await
    }

    pub async fn in_memory(blobs: Arc<dyn BlobStore>) -> Result<Self> {
        Self::connect("sqlite::memory:", blobs).await
    }

    pub async fn from_pool(pool: SqlitePool, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            blobs,
            retention: RETENTION,
            write_lock: Mutex::new(()),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Store the raw upload and record its summary.
    ///
    /// If recording fails the blob written here is removed again.
    pub async fn ingest(&self, bytes: &[u8], summary: &Summary) -> Result<DatasetRecord> {
        let name = format!("{}.csv", Uuid::new_v4());
        let file = self.blobs.put(&name, bytes).await?;

        match self.add(summary, &file).await {
            Ok(rec) => Ok(rec),
            Err(e) => {
                if let Err(del) = self.blobs.delete(&file).await {
                    warn!(file = %file.name, error = %del, "orphaned upload blob");
                }
                Err(e)
            }
        }
    }

    pub async fn add(&self, summary: &Summary, file: &FileReference) -> Result<DatasetRecord> {
        self.add_at(summary, file, Utc::now()).await
    }

    /// Insert a record with an explicit upload date, then evict past retention.
    ///
    /// Eviction picks the oldest `upload_date`, lowest id first on ties. The
    /// evicted rows go in the same transaction as the insert; their blobs are
    /// deleted after commit and a failure there is only logged. Only the file
    /// columns of evicted rows are read, so an unreadable summary never blocks
    /// retention.
    pub async fn add_at(
        &self,
        summary: &Summary,
        file: &FileReference,
        upload_date: DateTime<Utc>,
    ) -> Result<DatasetRecord> {
        check_finite(summary)?;
        let upload_date_us = upload_date.timestamp_micros();
        let summary_json = serde_json::to_string(summary)?;

        let guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO datasets (upload_date_us, summary, file_name, file_size, file_hash)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(upload_date_us)
        .bind(&summary_json)
        .bind(&file.name)
        .bind(file.size as i64)
        .bind(hex::encode(file.content_hash))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&mut *tx)
            .await?;

        let excess = count - self.retention as i64;
        let mut evicted = Vec::new();
        if excess > 0 {
            let rows: Vec<EvictionRow> = sqlx::query_as(
                r#"
                SELECT id, file_name, file_size, file_hash
                FROM datasets
                ORDER BY upload_date_us ASC, id ASC
                LIMIT ?
                "#,
            )
            .bind(excess)
            .fetch_all(&mut *tx)
            .await?;

            for row in rows {
                sqlx::query("DELETE FROM datasets WHERE id = ?")
                    .bind(row.id)
                    .execute(&mut *tx)
                    .await?;
                evicted.push(row);
            }
        }

        tx.commit().await?;
        drop(guard);

        info!(id, file = %file.name, rows = summary.total_count, "dataset stored");

        for old in evicted {
            info!(id = old.id, file = %old.file_name, "evicting dataset");
            let deleted = match old.file() {
                Ok(file) => self.blobs.delete(&file).await,
                Err(e) => Err(e),
            };
            if let Err(e) = deleted {
                warn!(id = old.id, file = %old.file_name, error = %e, "failed to delete evicted upload");
            }
        }

        let upload_date = DateTime::<Utc>::from_timestamp_micros(upload_date_us).unwrap_or(upload_date);
        Ok(DatasetRecord {
            id,
            upload_date,
            summary: summary.clone(),
            file: file.clone(),
        })
    }

    /// Newest record, if any.
    pub async fn latest(&self) -> Result<Option<DatasetRecord>> {
        let row: Option<DatasetRow> = sqlx::query_as(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets ORDER BY upload_date_us DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(DatasetRecord::try_from).transpose()
    }

    /// Newest first; `limit` is clamped to `1..=RETENTION`.
    pub async fn history(&self, limit: usize) -> Result<Vec<DatasetRecord>> {
        let limit = limit.clamp(1, self.retention);
        debug!(limit, "loading dataset history");

        let rows: Vec<DatasetRow> = sqlx::query_as(&format!(
            "SELECT {DATASET_COLUMNS} FROM datasets ORDER BY upload_date_us DESC, id DESC LIMIT ?"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DatasetRecord::try_from).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<DatasetRecord>> {
        let row: Option<DatasetRow> =
            sqlx::query_as(&format!("SELECT {DATASET_COLUMNS} FROM datasets WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(DatasetRecord::try_from).transpose()
    }

    pub async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}

// serde_json writes NaN and infinities as null, which would not read back
fn check_finite(summary: &Summary) -> Result<()> {
    let fields = [
        ("avg_flowrate", summary.avg_flowrate),
        ("avg_pressure", summary.avg_pressure),
        ("avg_temperature", summary.avg_temperature),
    ];
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(StoreError::InvalidSummary(format!("{name} is {v}"))),
        None => Ok(()),
    }
}
