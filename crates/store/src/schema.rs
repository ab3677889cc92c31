use chrono::{DateTime, Utc};
use equipment_stats::{HistoryEntry, Summary};
use serde::{Deserialize, Serialize};

use crate::StoreError;

pub type Hash32 = [u8; 32];

/// Handle to a raw upload in a [`BlobStore`](crate::BlobStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub name: String,           // <uuid>.csv
    pub size: u64,
    #[serde(with = "hex", rename = "content_hash_hex")]
    pub content_hash: Hash32,   // BLAKE3(file_bytes)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i64,
    pub upload_date: DateTime<Utc>,
    pub summary: Summary,
    pub file: FileReference,
}

impl From<DatasetRecord> for HistoryEntry {
    fn from(rec: DatasetRecord) -> Self {
        HistoryEntry::new(rec.id, rec.upload_date.to_rfc3339(), rec.summary)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DatasetRow {
    pub id: i64,
    pub upload_date_us: i64,
    pub summary: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: String,
}

/// The columns eviction needs; the summary is never decoded on that path.
#[derive(sqlx::FromRow)]
pub(crate) struct EvictionRow {
    pub id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: String,
}

impl EvictionRow {
    pub fn file(&self) -> Result<FileReference, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt { id: self.id, reason };

        let mut content_hash: Hash32 = [0u8; 32];
        hex::decode_to_slice(&self.file_hash, &mut content_hash)
            .map_err(|e| corrupt(format!("file hash: {e}")))?;
        Ok(FileReference {
            name: self.file_name.clone(),
            size: u64::try_from(self.file_size).map_err(|e| corrupt(format!("file size: {e}")))?,
            content_hash,
        })
    }
}

pub(crate) const DATASET_COLUMNS: &str = "id, upload_date_us, summary, file_name, file_size, file_hash";

impl TryFrom<DatasetRow> for DatasetRecord {
    type Error = StoreError;

    fn try_from(row: DatasetRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let upload_date = DateTime::<Utc>::from_timestamp_micros(row.upload_date_us)
            .ok_or_else(|| corrupt(format!("timestamp out of range: {}", row.upload_date_us)))?;
        let summary: Summary = serde_json::from_str(&row.summary)
            .map_err(|e| corrupt(format!("summary: {e}")))?;

        let mut content_hash: Hash32 = [0u8; 32];
        hex::decode_to_slice(&row.file_hash, &mut content_hash)
            .map_err(|e| corrupt(format!("file hash: {e}")))?;

        Ok(DatasetRecord {
            id,
            upload_date,
            summary,
            file: FileReference {
                name: row.file_name,
                size: u64::try_from(row.file_size).map_err(|e| corrupt(format!("file size: {e}")))?,
                content_hash,
            },
        })
    }
}
