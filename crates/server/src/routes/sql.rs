//! Routes backed by the lakehouse SQL endpoint. They answer 503 when no
//! endpoint is configured.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use models::{Recording, User};
use service::sql::QueryClient;

use crate::errors::ApiError;
use crate::state::AppState;

fn query_client(state: &AppState) -> Result<&QueryClient, ApiError> {
    state
        .sql
        .as_deref()
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "SQL endpoint not configured"))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let sql = query_client(&state)?;
    Ok(Json(sql.list_users(&state.session).await))
}

pub async fn active_recordings(State(state): State<AppState>) -> Result<Json<Vec<Recording>>, ApiError> {
    let sql = query_client(&state)?;
    Ok(Json(sql.active_recordings(&state.session).await))
}

/// 软删除：记录保留，标记为 inactive
pub async fn deactivate_recording(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let sql = query_client(&state)?;
    if sql.deactivate_recording(&state.session, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("recording {id} not found")))
    }
}
