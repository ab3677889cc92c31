use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::UploadResponse;

pub async fn post_upload(
    State(state): State<SharedState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut mp = mp?;
    let mut file_name: Option<String> = None;
    let mut file_bytes = None;

    while let Some(field) = mp.next_field().await? {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            file_bytes = Some(field.bytes().await?);
        }
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let file_name = file_name.unwrap_or_else(|| "upload.csv".to_string());

    // blocking parse + aggregate
    let raw = bytes.clone();
    let agg = tokio::task::spawn_blocking(move || equipment_stats::aggregate(&raw[..])).await??;

    if !agg.skipped.is_empty() {
        warn!(file = %file_name, skipped = agg.skipped.len(), "skipped malformed csv rows");
    }

    let rec = state.store.ingest(&bytes, &agg.summary).await?;
    info!(id = rec.id, file = %file_name, stored_as = %rec.file.name, rows = rec.summary.total_count, "upload accepted");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Upload successful".to_string(),
            summary: rec.summary,
        }),
    ))
}
