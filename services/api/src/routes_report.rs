use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use equipment_report::{ReportLayout, REPORT_FILENAME};
use equipment_store::DatasetRecord;
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn get_report(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let latest = state.store.latest().await?.ok_or_else(ApiError::no_data)?;

    let id = latest.id;
    let report = report_layout(&latest);
    let pdf = tokio::task::spawn_blocking(move || equipment_report::render_layout(&report)).await??;
    info!(id, bytes = pdf.len(), "report rendered");

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{REPORT_FILENAME}\"")),
    ];
    Ok((headers, pdf))
}

/// The footer date is the dataset's upload time, so a report is reproducible.
fn report_layout(rec: &DatasetRecord) -> ReportLayout {
    equipment_report::layout(&rec.summary, rec.upload_date)
}
