use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fallback::FALLBACK_TITLES;
use crate::recording::Recording;
use crate::training_day::TrainingDay;

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_days: usize,
    pub unlocked_days: usize,
    pub locked_days: usize,
    pub recordings_available: usize,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardStats {
    pub fn compute(days: &[TrainingDay], recordings: &[Recording], now: DateTime<Utc>) -> Self {
        let unlocked = days.iter().filter(|d| d.is_unlocked).count();
        Self {
            total_days: days.len(),
            unlocked_days: unlocked,
            locked_days: days.len() - unlocked,
            recordings_available: recordings.iter().filter(|r| r.is_active).count(),
            last_updated: Some(now),
        }
    }

    /// Value reported when the store cannot be read.
    pub fn fallback() -> Self {
        Self {
            total_days: FALLBACK_TITLES.len(),
            unlocked_days: 0,
            locked_days: FALLBACK_TITLES.len(),
            recordings_available: 0,
            last_updated: None,
        }
    }
}
