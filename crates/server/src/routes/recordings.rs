use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use models::{Recording, RecordingInput};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list_recordings(State(state): State<AppState>) -> Json<Vec<Recording>> {
    Json(state.portal.get_all_recordings().await)
}

/// 上传录像元数据，返回 201 与新记录
pub async fn upload_recording(
    State(state): State<AppState>,
    Json(input): Json<RecordingInput>,
) -> Result<(StatusCode, Json<Recording>), ApiError> {
    let recording = state.portal.upload_recording(&state.session, input).await?;
    Ok((StatusCode::CREATED, Json(recording)))
}

pub async fn remove_recording(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if state.portal.remove_recording(&state.session, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("recording {id} not found")))
    }
}

pub async fn remove_for_day(
    State(state): State<AppState>,
    Path(day): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.portal.remove_recording_for_day(&state.session, day).await?;
    Ok(Json(json!({ "dayNumber": day, "removed": removed })))
}
