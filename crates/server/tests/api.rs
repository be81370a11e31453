use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use models::fallback;
use server::routes;
use server::AppState;
use service::auth::Session;
use service::portal::DynPortalClient;
use service::storage::{DocumentStore, MemoryStore, RECORDINGS_DOC, TRAINING_DAYS_DOC};

const KEY: &str = "test-admin-key";

fn app_with(store: Arc<MemoryStore>) -> Router {
    let dyn_store: Arc<dyn DocumentStore> = store;
    let state = AppState::new(DynPortalClient::new(dyn_store), Session::anonymous(), vec![KEY.to_string()]);
    routes::build_router(state, CorsLayer::very_permissive())
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let bytes = res.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri).header("X-API-Key", KEY);
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn root_and_health() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health"], "/api/v1/health");

    let (status, body) = send(&app, get("/api/v1/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn empty_store_serves_fallback_days() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/training-days")).await?;
    assert_eq!(status, StatusCode::OK);
    let days = body.as_array().expect("array");
    assert_eq!(days.len(), 12);
    assert_eq!(days[0]["title"], fallback::FALLBACK_TITLES[0]);

    let (_, unlocked) = send(&app, get("/api/v1/training-days/unlocked")).await?;
    assert_eq!(unlocked, json!([]));

    let (_, stats) = send(&app, get("/api/v1/stats")).await?;
    assert_eq!(stats["totalDays"], 12);
    assert_eq!(stats["lockedDays"], 12);
    Ok(())
}

#[tokio::test]
async fn single_day_lookup() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let (status, body) = send(&app, get("/api/v1/training-days/3")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dayNumber"], 3);

    let (status, body) = send(&app, get("/api/v1/training-days/99")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("99"));

    let res = app.clone().oneshot(get("/api/v1/training-days/abc")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn writes_require_admin_key() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let res = app.clone().oneshot(Request::post("/api/v1/training-days/1/unlock").body(Body::empty())?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::post("/api/v1/training-days/1/unlock").header("X-API-Key", "nope").body(Body::empty())?;
    assert_eq!(app.clone().oneshot(wrong).await?.status(), StatusCode::UNAUTHORIZED);
    assert!(store.writes().is_empty());

    let bearer = Request::post("/api/v1/training-days/1/lock")
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .body(Body::empty())?;
    assert_eq!(app.clone().oneshot(bearer).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn query_key_with_reserved_characters() -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let keys = vec!["k+ey/9=".to_string()];
    let app = routes::build_router(
        AppState::new(DynPortalClient::new(store), Session::anonymous(), keys),
        CorsLayer::very_permissive(),
    );

    let encoded = Request::post("/api/v1/training-days/4/unlock?api_key=k%2Bey%2F9%3D").body(Body::empty())?;
    assert_eq!(app.clone().oneshot(encoded).await?.status(), StatusCode::OK);

    // 未编码的 `+` 解码为空格，不匹配
    let raw_plus = Request::post("/api/v1/training-days/4/lock?api_key=k+ey/9=").body(Body::empty())?;
    assert_eq!(app.clone().oneshot(raw_plus).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unlock_and_lock_round_trip() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let (status, day) = send(
        &app,
        admin("POST", "/api/v1/training-days/2/unlock", Some(json!({ "unlockedBy": "trainer@example.com" }))),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["isUnlocked"], true);
    assert_eq!(day["unlockedBy"], "trainer@example.com");
    assert_eq!(store.writes(), vec![TRAINING_DAYS_DOC.to_string()]);

    let (_, unlocked) = send(&app, get("/api/v1/training-days/unlocked")).await?;
    assert_eq!(unlocked.as_array().map(Vec::len), Some(1));

    // no body: actor defaults to admin
    let (_, day) = send(&app, admin("POST", "/api/v1/training-days/3/unlock", None)).await?;
    assert_eq!(day["unlockedBy"], "admin");

    let (status, day) = send(&app, admin("POST", "/api/v1/training-days/2/lock", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["isUnlocked"], false);
    assert_eq!(day["unlockedAt"], Value::Null);

    let (status, _) = send(&app, admin("POST", "/api/v1/training-days/40/unlock", None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn recording_lifecycle() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let input = json!({
        "dayNumber": 4,
        "title": "DAX Fundamentals recording",
        "videoUrl": "https://www.youtube.com/watch?v=abc123",
        "duration": "1:45:00"
    });
    let (status, rec) = send(&app, admin("POST", "/api/v1/recordings", Some(input))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rec["embedUrl"], "https://www.youtube.com/embed/abc123");
    assert_eq!(rec["platform"], "YOUTUBE");
    let id = rec["recordingId"].as_str().expect("id").to_string();

    let (_, days) = send(&app, get("/api/v1/training-days")).await?;
    assert_eq!(days[3]["recording"]["recordingId"], id.as_str());
    assert!(days[0].get("recording").is_none());

    let (_, list) = send(&app, get("/api/v1/recordings")).await?;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, admin("DELETE", &format!("/api/v1/recordings/{id}"), None)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, admin("DELETE", &format!("/api/v1/recordings/{id}"), None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.document_json(RECORDINGS_DOC), Some(json!([])));
    Ok(())
}

#[tokio::test]
async fn remove_recordings_for_day() -> anyhow::Result<()> {
    let app = app_with(Arc::new(MemoryStore::new()));
    let input = json!({ "dayNumber": 5, "title": "Day 5", "videoUrl": "https://vimeo.com/12345" });
    send(&app, admin("POST", "/api/v1/recordings", Some(input))).await?;

    let (status, body) = send(&app, admin("DELETE", "/api/v1/training-days/5/recording", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "dayNumber": 5, "removed": 1 }));
    Ok(())
}

#[tokio::test]
async fn invalid_upload_is_bad_request() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());
    let input = json!({ "dayNumber": 0, "title": "x", "videoUrl": "https://youtu.be/x" });
    let (status, body) = send(&app, admin("POST", "/api/v1/recordings", Some(input))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(store.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn unavailable_store_degrades_reads_and_fails_writes() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.set_unavailable(true);
    let app = app_with(store.clone());

    let (status, days) = send(&app, get("/api/v1/training-days")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(days.as_array().map(Vec::len), Some(12));

    let (status, stats) = send(&app, get("/api/v1/stats")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["lastUpdated"], Value::Null);

    let (status, body) = send(&app, admin("POST", "/api/v1/training-days/1/unlock", None)).await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
    Ok(())
}
