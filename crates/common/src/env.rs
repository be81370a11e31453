//! Environment/runtime helpers
//!
//! Sanity checks for directories the binaries write into.

use std::path::Path;

use tracing::debug;

/// Ensure an output directory exists, creating it (and its parents) if missing.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> anyhow::Result<()> {
    let dir = dir.as_ref();
    if tokio::fs::metadata(dir).await.is_ok() {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    debug!(dir = %dir.display(), "created output directory");
    Ok(())
}
