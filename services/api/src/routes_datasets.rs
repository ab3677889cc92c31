use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use equipment_stats::Summary;
use equipment_store::RETENTION;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{HistoryEntry, HistoryQuery};

pub async fn get_summary(State(state): State<SharedState>) -> Result<Json<Summary>, ApiError> {
    let latest = state.store.latest().await?.ok_or_else(ApiError::no_data)?;
    Ok(Json(latest.summary))
}

pub async fn get_history(
    State(state): State<SharedState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let Query(q) = query?;
    let limit = q.limit.unwrap_or(RETENTION);
    let records = state.store.history(limit).await?;
    Ok(Json(records.into_iter().map(HistoryEntry::from).collect()))
}
