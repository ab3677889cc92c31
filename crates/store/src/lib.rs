//! Dataset store
//!
//! Keeps the last few uploads (summary + raw CSV) and evicts the oldest one
//! in the same transaction that inserts a new one.

mod blob;
mod schema;
mod store;

pub use blob::{BlobStore, FsBlobStore, InMemoryBlobStore};
pub use schema::{DatasetRecord, FileReference, Hash32};
pub use store::{DatasetStore, RETENTION};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Blob storage error: {0}")]
    Blob(String),

    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Serialization error: {0}")]
    Ser(#[from] serde_json::Error),

    #[error("Summary cannot be stored: {0}")]
    InvalidSummary(String),

    #[error("Corrupt dataset row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
