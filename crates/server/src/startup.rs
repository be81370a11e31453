use std::net::SocketAddr;

use axum::http::{HeaderValue, Method};
use axum::Router;
use configs::{AppConfig, CorsConfig};
use service::auth::Session;
use service::portal::DynPortalClient;
use service::sql::QueryClient;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

/// Restrict CORS to the configured origins; unparsable entries are skipped.
pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Store client and write session from configuration.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let portal = DynPortalClient::from_config(&cfg.store)?;
    let session = Session::from_config(&cfg.identity).await?;
    let sql = QueryClient::from_config(&cfg.sql)?;
    info!(
        event = "store_configured",
        base_url = %cfg.store.base_url,
        identity = session.provider_name(),
        conditional_writes = cfg.store.conditional_writes,
        sql_enabled = sql.is_some(),
        "portal store ready"
    );
    if cfg.server.admin_api_keys.is_empty() {
        warn!(event = "admin_keys_unset", "no admin keys configured; write routes will refuse every request");
    }
    Ok(AppState::new(portal, session, cfg.server.admin_api_keys.clone()).with_sql(sql))
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    routes::build_router(state, build_cors(&cfg.cors))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
    }
}

/// Public entry: load configuration, build the app and run the HTTP server
/// until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load_and_validate()?;
    let state = build_state(&cfg).await?;
    let app = build_app(state, &cfg);

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting training portal server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
