use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::recording::Recording;

/// One day of the training programme as stored in `training_days.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDay {
    pub day_number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlocked_by: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub presentation_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_url: Option<String>,
    /// Active recording for this day; only filled in by cross-referencing reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<Recording>,
}

impl TrainingDay {
    /// A locked day with no unlock metadata.
    pub fn locked(day_number: u32, title: impl Into<String>) -> Self {
        Self {
            day_number,
            title: title.into(),
            description: None,
            is_unlocked: false,
            unlocked_at: None,
            unlocked_by: None,
            presentation_url: String::new(),
            resources_url: None,
            recording: None,
        }
    }

    pub fn unlock(&mut self, actor: &str, at: DateTime<Utc>) {
        self.is_unlocked = true;
        self.unlocked_at = Some(at);
        self.unlocked_by = Some(actor.to_string());
    }

    pub fn lock(&mut self) {
        self.is_unlocked = false;
        self.unlocked_at = None;
        self.unlocked_by = None;
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.day_number == 0 {
            return Err(ModelError::invalid("dayNumber must be positive"));
        }
        let has_meta = self.unlocked_at.is_some() && self.unlocked_by.is_some();
        let no_meta = self.unlocked_at.is_none() && self.unlocked_by.is_none();
        if self.is_unlocked && !has_meta {
            return Err(ModelError::invalid(format!(
                "day {} is unlocked but unlockedAt/unlockedBy are missing",
                self.day_number
            )));
        }
        if !self.is_unlocked && !no_meta {
            return Err(ModelError::invalid(format!(
                "day {} is locked but carries unlock metadata",
                self.day_number
            )));
        }
        Ok(())
    }
}

/// Check every day and that `dayNumber` is unique across the collection.
pub fn validate_days(days: &[TrainingDay]) -> Result<(), ModelError> {
    let mut seen = HashSet::with_capacity(days.len());
    for day in days {
        day.validate()?;
        if !seen.insert(day.day_number) {
            return Err(ModelError::invalid(format!("duplicate dayNumber {}", day.day_number)));
        }
    }
    Ok(())
}
