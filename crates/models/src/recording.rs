use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Hosting platform of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoPlatform {
    #[serde(alias = "youtube")]
    Youtube,
    #[serde(alias = "vimeo")]
    Vimeo,
    #[serde(alias = "google_drive")]
    GoogleDrive,
    #[serde(alias = "azure")]
    Azure,
    #[default]
    #[serde(alias = "direct")]
    Direct,
    #[serde(other)]
    Other,
}

impl VideoPlatform {
    /// Guess the platform from a shared/watch URL.
    pub fn detect(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains("youtube.com/") || lower.contains("youtu.be/") {
            Self::Youtube
        } else if lower.contains("vimeo.com/") {
            Self::Vimeo
        } else if lower.contains("drive.google.com") {
            Self::GoogleDrive
        } else if lower.contains(".blob.core.windows.net") || lower.contains(".azureedge.net") {
            Self::Azure
        } else {
            Self::Direct
        }
    }
}

/// A session recording as stored in `recordings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub recording_id: Uuid,
    pub day_number: u32,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub embed_url: String,
    #[serde(default)]
    pub platform: VideoPlatform,
    #[serde(default)]
    pub duration: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

/// Fields supplied by whoever uploads a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInput {
    pub day_number: u32,
    pub title: String,
    pub video_url: String,
    /// Detected from `video_url` when absent.
    #[serde(default)]
    pub platform: Option<VideoPlatform>,
    #[serde(default)]
    pub duration: String,
    #[serde(default = "default_uploader")]
    pub uploaded_by: String,
}

fn default_uploader() -> String { "admin".into() }

impl RecordingInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.day_number == 0 {
            return Err(ModelError::invalid("dayNumber must be positive"));
        }
        if self.title.trim().is_empty() {
            return Err(ModelError::invalid("title required"));
        }
        let lower = self.video_url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(ModelError::invalid("videoUrl must be an http(s) URL"));
        }
        Ok(())
    }
}

impl Recording {
    /// Build a fresh, active recording with zero views.
    pub fn from_input(input: RecordingInput, recording_id: Uuid, embed_url: String, now: DateTime<Utc>) -> Self {
        let platform = input.platform.unwrap_or_else(|| VideoPlatform::detect(&input.video_url));
        Self {
            recording_id,
            day_number: input.day_number,
            title: input.title,
            video_url: input.video_url,
            embed_url,
            platform,
            duration: input.duration,
            uploaded_at: now,
            uploaded_by: input.uploaded_by,
            view_count: 0,
            is_active: true,
        }
    }
}

/// Check ids are unique and every recording points at a positive day.
pub fn validate_recordings(recordings: &[Recording]) -> Result<(), ModelError> {
    let mut ids = HashSet::with_capacity(recordings.len());
    for r in recordings {
        if r.day_number == 0 {
            return Err(ModelError::invalid(format!("recording {} has dayNumber 0", r.recording_id)));
        }
        if !ids.insert(r.recording_id) {
            return Err(ModelError::invalid(format!("duplicate recordingId {}", r.recording_id)));
        }
    }
    Ok(())
}
