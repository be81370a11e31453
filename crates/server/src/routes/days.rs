use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use models::{DashboardStats, TrainingDay};

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    #[serde(default)]
    pub unlocked_by: Option<String>,
}

/// 所有培训日（附带当日录像）
pub async fn list_days(State(state): State<AppState>) -> Json<Vec<TrainingDay>> {
    Json(state.portal.get_training_days_with_recordings().await)
}

pub async fn unlocked_days(State(state): State<AppState>) -> Json<Vec<TrainingDay>> {
    Json(state.portal.get_unlocked_days().await)
}

pub async fn get_day(State(state): State<AppState>, Path(day): Path<u32>) -> Result<Json<TrainingDay>, ApiError> {
    state
        .portal
        .get_training_day(day)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("day {day} not found")))
}

pub async fn unlock_day(
    State(state): State<AppState>,
    Path(day): Path<u32>,
    body: Option<Json<UnlockRequest>>,
) -> Result<Json<TrainingDay>, ApiError> {
    let actor = body
        .and_then(|Json(b)| b.unlocked_by)
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "admin".to_string());
    let updated = state.portal.unlock_day(&state.session, day, &actor).await?;
    Ok(Json(updated))
}

pub async fn lock_day(State(state): State<AppState>, Path(day): Path<u32>) -> Result<Json<TrainingDay>, ApiError> {
    let updated = state.portal.lock_day(&state.session, day).await?;
    Ok(Json(updated))
}

pub async fn stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.portal.get_dashboard_stats().await)
}
