use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::state::AppState;

/// Middleware: require a configured admin key on write routes, sent as
/// `X-API-Key`, `Authorization: Bearer <key>` or the `api_key` query param.
/// With no keys configured every write is refused.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.admin_keys.is_empty() {
        warn!(event = "admin_keys_unset", path = %req.uri().path(), "write refused: no admin keys configured");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let accepted = presented_key(&req)
        .filter(|k| !k.trim().is_empty())
        .is_some_and(|k| state.admin_keys.iter().fold(false, |hit, known| hit | keys_match(known, &k)));
    if !accepted {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Compares every byte regardless of where the first mismatch is.
fn keys_match(known: &str, presented: &str) -> bool {
    let (a, b) = (known.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn presented_key(req: &Request) -> Option<String> {
    let headers = req.headers();
    if let Some(k) = headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.trim().to_string());
    }
    // 查询参数按 urlencoded 解码（`+`、`%2B` 等）
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(req.uri()).ok()?;
    params.remove("api_key")
}
