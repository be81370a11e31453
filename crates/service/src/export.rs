//! Local snapshot of the portal documents, used for backups and offline review.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use models::DashboardStats;

use crate::errors::ServiceError;
use crate::portal::PortalClient;
use crate::storage::{DocumentStore, RECORDINGS_DOC, TRAINING_DAYS_DOC};

pub const STATS_FILE: &str = "stats.json";

/// What a snapshot wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub directory: PathBuf,
    pub training_days: usize,
    pub recordings: usize,
    pub stats: DashboardStats,
}

/// Write `training_days.json`, `recordings.json` and `stats.json` into `dir`.
///
/// Uses the read paths, so an unreachable store yields the fallback content
/// rather than an error.
pub async fn export_snapshot<S>(client: &PortalClient<S>, dir: impl AsRef<Path>) -> Result<ExportSummary, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let dir = dir.as_ref();
    common::env::ensure_dir(dir).await.map_err(|e| ServiceError::Io(e.to_string()))?;

    let days = client.get_all_training_days().await;
    let recordings = client.get_all_recordings().await;
    let stats = DashboardStats::compute(&days, &recordings, Utc::now());

    write_json(&dir.join(TRAINING_DAYS_DOC), &days).await?;
    write_json(&dir.join(RECORDINGS_DOC), &recordings).await?;
    write_json(&dir.join(STATS_FILE), &stats).await?;

    info!(dir = %dir.display(), days = days.len(), recordings = recordings.len(), "snapshot exported");
    Ok(ExportSummary {
        directory: dir.to_path_buf(),
        training_days: days.len(),
        recordings: recordings.len(),
        stats,
    })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ServiceError> {
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}
