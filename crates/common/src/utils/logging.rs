use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` when set, otherwise `default`.
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Human-readable compact lines on stdout for the long-running server.
/// Defaults to `info` plus per-request spans from `tower_http`.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter("info,tower_http=info"))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout, for log shipping (`LOG_FORMAT=json`).
pub fn init_logging_json() {
    // service::portal 的读写细节默认以 debug 输出，可通过 RUST_LOG 覆盖
    let _ = fmt()
        .with_env_filter(env_filter("info,service::portal=debug"))
        .with_target(true)
        .json()
        .with_current_span(true)
        .with_writer(io::stdout)
        .try_init();
}

/// Warnings and errors only, on stderr, so the admin CLI's stdout stays
/// machine-readable.
pub fn init_logging_cli() {
    let _ = fmt()
        .with_env_filter(env_filter("warn"))
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}
