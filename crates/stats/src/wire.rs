//! JSON bodies exchanged between the API service and its clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Summary;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub summary: Summary,
}

/// One history row: record metadata with the summary fields inlined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub upload_date: String, // RFC 3339
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: BTreeMap<String, u64>,
}

impl HistoryEntry {
    pub fn new(id: i64, upload_date: String, summary: Summary) -> Self {
        let Summary { total_count, avg_flowrate, avg_pressure, avg_temperature, type_distribution } = summary;
        Self {
            id,
            upload_date,
            total_count,
            avg_flowrate,
            avg_pressure,
            avg_temperature,
            type_distribution,
        }
    }
}
