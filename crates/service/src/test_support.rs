#![cfg(test)]
//! In-process stand-in for the data-lake file endpoint, the identity token
//! endpoint and the SQL endpoint. Binds to an ephemeral localhost port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub name: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub ms_version: Option<String>,
    pub if_match: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct LakeState {
    files: HashMap<String, (Vec<u8>, u64)>,
    version: u64,
    puts: Vec<RecordedPut>,
    required_token: Option<String>,
    token_requests: Vec<HashMap<String, String>>,
    tokens_issued: u64,
    sql_rows: Value,
    sql_requests: Vec<RecordedQuery>,
    sql_failing: bool,
}

type Shared = Arc<Mutex<LakeState>>;

pub struct FakeLake {
    addr: SocketAddr,
    state: Shared,
    task: tokio::task::JoinHandle<()>,
}

impl FakeLake {
    pub async fn start() -> anyhow::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(LakeState { sql_rows: json!([]), ..Default::default() }));
        let app = Router::new()
            .route("/files/:name", get(get_file).put(put_file))
            .route("/token", post(issue_token))
            .route("/sql", post(run_query))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self { addr, state, task })
    }

    pub fn files_url(&self) -> String { format!("http://{}/files", self.addr) }
    pub fn token_url(&self) -> String { format!("http://{}/token", self.addr) }
    pub fn sql_url(&self) -> String { format!("http://{}/sql", self.addr) }

    pub fn puts(&self) -> Vec<RecordedPut> { self.lock().puts.clone() }
    pub fn token_requests(&self) -> Vec<HashMap<String, String>> { self.lock().token_requests.clone() }
    pub fn sql_requests(&self) -> Vec<RecordedQuery> { self.lock().sql_requests.clone() }

    /// Reject PUTs whose bearer token differs from `token`.
    pub fn require_token(&self, token: &str) { self.lock().required_token = Some(token.to_string()); }

    pub fn set_sql_rows(&self, rows: Value) { self.lock().sql_rows = rows; }
    pub fn fail_sql(&self, failing: bool) { self.lock().sql_failing = failing; }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().files.get(name).map(|(body, _)| body.clone())
    }

    fn lock(&self) -> MutexGuard<'_, LakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for FakeLake {
    fn drop(&mut self) { self.task.abort(); }
}

fn etag(version: u64) -> String { format!("\"{version}\"") }

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn get_file(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    let st = state.lock().unwrap_or_else(|p| p.into_inner());
    match st.files.get(&name) {
        Some((body, version)) => {
            (StatusCode::OK, [(header::ETAG, etag(*version))], body.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "PathNotFound").into_response(),
    }
}

async fn put_file(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut st = state.lock().unwrap_or_else(|p| p.into_inner());
    let put = RecordedPut {
        name: name.clone(),
        authorization: header_string(&headers, "authorization"),
        content_type: header_string(&headers, "content-type"),
        ms_version: header_string(&headers, "x-ms-version"),
        if_match: header_string(&headers, "if-match"),
        body: body.to_vec(),
    };
    st.puts.push(put.clone());

    if let Some(required) = &st.required_token {
        if put.authorization.as_deref() != Some(format!("Bearer {required}").as_str()) {
            return (StatusCode::UNAUTHORIZED, "InvalidAuthenticationInfo").into_response();
        }
    }
    if let Some(expected) = &put.if_match {
        let current = st.files.get(&name).map(|(_, v)| etag(*v));
        if current.as_deref() != Some(expected.as_str()) {
            return (StatusCode::PRECONDITION_FAILED, "ConditionNotMet").into_response();
        }
    }
    st.version += 1;
    let version = st.version;
    st.files.insert(name, (put.body, version));
    (StatusCode::CREATED, [(header::ETAG, etag(version))]).into_response()
}

async fn issue_token(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    let mut st = state.lock().unwrap_or_else(|p| p.into_inner());
    let rejected = form.get("client_secret").map(String::as_str) == Some("wrong");
    st.token_requests.push(form);
    if rejected {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_client" }))).into_response();
    }
    st.tokens_issued += 1;
    Json(json!({
        "access_token": format!("tok-{}", st.tokens_issued),
        "expires_in": 3600,
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn run_query(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut st = state.lock().unwrap_or_else(|p| p.into_inner());
    st.sql_requests.push(RecordedQuery { authorization: header_string(&headers, "authorization"), body });
    if st.sql_failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "endpoint unavailable").into_response();
    }
    Json(json!({ "rows": st.sql_rows.clone() })).into_response()
}
