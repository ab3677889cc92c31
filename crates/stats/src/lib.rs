//! Summary statistics for chemical-equipment CSV uploads.
//!
//! Parses the five-column equipment format, skips malformed rows and
//! aggregates the survivors into a [`Summary`].

mod schema;
mod builder;
mod parse;
mod wire;

pub use schema::{EquipmentRow, Summary, REQUIRED_COLUMNS};
pub use builder::{round2, SummaryBuilder};
pub use parse::{aggregate, compute_summary, Aggregation, ParseError, SkippedRow};
pub use wire::{HistoryEntry, UploadResponse};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Invalid columns. Expected: {}; found: {}", REQUIRED_COLUMNS.join(", "), .found.join(", "))]
    Schema { found: Vec<String> },

    #[error("No valid rows found ({skipped} rows skipped)")]
    NoValidRows { skipped: usize },

    #[error("CSV parsing error: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, SummaryError>;
