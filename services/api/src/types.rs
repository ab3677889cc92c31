use serde::Deserialize;

pub use equipment_stats::{HistoryEntry, UploadResponse};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}
