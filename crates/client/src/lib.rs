//! Client for the equipment dataset API, with terminal tables and SVG charts.

mod api;
pub mod charts;
pub mod render;

pub use api::ApiClient;
pub use equipment_stats::{HistoryEntry, UploadResponse};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API connection failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer; `message` is the server's `error` string verbatim.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
