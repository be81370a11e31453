use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::{Health, ServiceInfo};

use crate::admin;
use crate::state::AppState;

pub mod days;
pub mod recordings;
pub mod sql;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Power BI training portal API".into(),
        version: VERSION.into(),
        health: "/api/v1/health".into(),
    })
}

pub async fn health() -> Json<Health> {
    Json(Health::ok(VERSION))
}

/// Build the full application router: public reads plus key-protected writes.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/training-days", get(days::list_days))
        .route("/api/v1/training-days/unlocked", get(days::unlocked_days))
        .route("/api/v1/training-days/:day", get(days::get_day))
        .route("/api/v1/recordings", get(recordings::list_recordings))
        .route("/api/v1/recordings/active", get(sql::active_recordings))
        .route("/api/v1/stats", get(days::stats));

    let writes = Router::new()
        .route("/api/v1/training-days/:day/unlock", post(days::unlock_day))
        .route("/api/v1/training-days/:day/lock", post(days::lock_day))
        .route("/api/v1/training-days/:day/recording", delete(recordings::remove_for_day))
        .route("/api/v1/recordings", post(recordings::upload_recording))
        .route("/api/v1/recordings/:id", delete(recordings::remove_recording))
        .route("/api/v1/recordings/:id/deactivate", post(sql::deactivate_recording))
        .route("/api/v1/users", get(sql::list_users))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin::require_admin_key));

    public
        .merge(writes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时记录状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
