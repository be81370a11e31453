//! Training day and recording operations over a [`DocumentStore`].
//!
//! Both collections are read in full and written back in full. Reads never
//! fail: they log and fall back to the built-in day list or an empty
//! recording list. Writes log and return the error to the caller.

use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use models::recording::validate_recordings;
use models::training_day::validate_days;
use models::{fallback, DashboardStats, Recording, RecordingInput, TrainingDay};

use crate::auth::Session;
use crate::embed::generate_embed_url;
use crate::errors::ServiceError;
use crate::ids::generate_uuid;
use crate::storage::{DocumentStore, OneLakeStore, WriteOptions, RECORDINGS_DOC, TRAINING_DAYS_DOC};

/// A decoded collection together with the ETag it was read at.
#[derive(Debug, Clone)]
struct Collection<T> {
    items: Vec<T>,
    etag: Option<String>,
}

impl<T> Collection<T> {
    fn unversioned(items: Vec<T>) -> Self { Self { items, etag: None } }
}

/// Client for the training portal documents.
///
/// ```
/// use std::sync::Arc;
/// use service::auth::Session;
/// use service::storage::MemoryStore;
/// use service::PortalClient;
///
/// tokio_test::block_on(async {
///     let portal = PortalClient::new(Arc::new(MemoryStore::new()));
///     // nothing stored yet: the built-in programme is served
///     assert_eq!(portal.get_all_training_days().await.len(), 12);
///
///     let day = portal.unlock_day(&Session::anonymous(), 1, "admin").await.unwrap();
///     assert!(day.is_unlocked);
///     assert_eq!(portal.get_unlocked_days().await.len(), 1);
/// });
/// ```
pub struct PortalClient<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    conditional_writes: bool,
}

/// Client over a type-erased store, as held by long-lived servers.
pub type DynPortalClient = PortalClient<dyn DocumentStore>;

impl DynPortalClient {
    /// OneLake-backed client for the configured store location.
    pub fn from_config(cfg: &configs::StoreConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn DocumentStore> = Arc::new(OneLakeStore::from_config(cfg)?);
        Ok(Self::new(store).with_conditional_writes(cfg.conditional_writes))
    }
}

fn log_failure<T>(op: &'static str, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
    if let Err(e) = &result {
        error!(op, error = %e, "portal write failed");
    }
    result
}

impl<S: DocumentStore + ?Sized> PortalClient<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store, conditional_writes: true } }

    /// Toggle `If-Match` on read-modify-write operations.
    pub fn with_conditional_writes(mut self, enabled: bool) -> Self {
        self.conditional_writes = enabled;
        self
    }

    pub fn store(&self) -> &Arc<S> { &self.store }

    // ---- reads ----

    /// All training days, or the built-in list when the store can't be read.
    #[instrument(skip(self))]
    pub async fn get_all_training_days(&self) -> Vec<TrainingDay> {
        match self.load_days().await {
            Ok(days) => {
                debug!(count = days.items.len(), "training days loaded");
                days.items
            }
            Err(e) => {
                warn!(error = %e, "failed to load training days, using fallback");
                fallback::training_days()
            }
        }
    }

    /// Training days with each day's active recording embedded.
    pub async fn get_training_days_with_recordings(&self) -> Vec<TrainingDay> {
        let mut days = self.get_all_training_days().await;
        let recordings = self.get_all_recordings().await;
        for day in &mut days {
            day.recording = recordings
                .iter()
                .find(|r| r.is_active && r.day_number == day.day_number)
                .cloned();
        }
        days
    }

    /// Fetches the whole collection and scans it; no caching.
    pub async fn get_training_day(&self, day_number: u32) -> Option<TrainingDay> {
        self.get_all_training_days()
            .await
            .into_iter()
            .find(|d| d.day_number == day_number)
    }

    pub async fn get_unlocked_days(&self) -> Vec<TrainingDay> {
        self.get_all_training_days()
            .await
            .into_iter()
            .filter(|d| d.is_unlocked)
            .collect()
    }

    /// All recordings, or an empty list when the store can't be read.
    #[instrument(skip(self))]
    pub async fn get_all_recordings(&self) -> Vec<Recording> {
        match self.load_recordings().await {
            Ok(recordings) => recordings.items,
            Err(e) => {
                warn!(error = %e, "failed to load recordings");
                Vec::new()
            }
        }
    }

    /// Dashboard counters. Missing documents count as the built-in days and no
    /// recordings; any other read failure yields the fixed fallback value.
    #[instrument(skip(self))]
    pub async fn get_dashboard_stats(&self) -> DashboardStats {
        // a document that does not exist yet counts as empty, not as an outage
        let days = match self.days_for_update().await {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "stats: training days unavailable, using fallback stats");
                return DashboardStats::fallback();
            }
        };
        let recordings = match self.recordings_for_update().await {
            Ok(recordings) => recordings,
            Err(e) => {
                warn!(error = %e, "stats: recordings unavailable, using fallback stats");
                return DashboardStats::fallback();
            }
        };
        DashboardStats::compute(&days.items, &recordings.items, Utc::now())
    }

    // ---- writes ----

    /// Mark a day unlocked by `actor` and persist the whole collection.
    #[instrument(skip(self, session))]
    pub async fn unlock_day(&self, session: &Session, day_number: u32, actor: &str) -> Result<TrainingDay, ServiceError> {
        let result = self
            .modify_day(session, day_number, |day| day.unlock(actor, Utc::now()))
            .await;
        if result.is_ok() {
            info!(event = "day_unlocked", day_number, actor, "training day unlocked");
        }
        log_failure("unlock_day", result)
    }

    /// Mark a day locked, clearing its unlock metadata, and persist.
    #[instrument(skip(self, session))]
    pub async fn lock_day(&self, session: &Session, day_number: u32) -> Result<TrainingDay, ServiceError> {
        let result = self.modify_day(session, day_number, TrainingDay::lock).await;
        if result.is_ok() {
            info!(event = "day_locked", day_number, "training day locked");
        }
        log_failure("lock_day", result)
    }

    /// Unlock every day with one shared timestamp and a single write.
    #[instrument(skip(self, session))]
    pub async fn unlock_all_days(&self, session: &Session, actor: &str) -> Result<Vec<TrainingDay>, ServiceError> {
        let result = async {
            let mut days = self.days_for_update().await?;
            let now = Utc::now();
            for day in &mut days.items {
                day.unlock(actor, now);
            }
            self.persist_days(session, &days.items, days.etag.as_deref()).await?;
            info!(event = "all_days_unlocked", count = days.items.len(), actor, "all training days unlocked");
            Ok::<_, ServiceError>(days.items)
        }
        .await;
        log_failure("unlock_all_days", result)
    }

    /// Replace `training_days.json` with `days`.
    #[instrument(skip(self, session, days), fields(count = days.len()))]
    pub async fn save_training_days(&self, session: &Session, days: &[TrainingDay]) -> Result<(), ServiceError> {
        let result = async {
            validate_days(days)?;
            self.persist_days(session, days, None).await
        }
        .await;
        log_failure("save_training_days", result)
    }

    /// Replace `recordings.json` with `recordings`.
    #[instrument(skip(self, session, recordings), fields(count = recordings.len()))]
    pub async fn save_recordings(&self, session: &Session, recordings: &[Recording]) -> Result<(), ServiceError> {
        let result = async {
            validate_recordings(recordings)?;
            self.persist(session, RECORDINGS_DOC, recordings, None).await
        }
        .await;
        log_failure("save_recordings", result)
    }

    /// Add a recording for a day, replacing whatever that day had before.
    #[instrument(skip(self, session, input), fields(day_number = input.day_number))]
    pub async fn upload_recording(&self, session: &Session, input: RecordingInput) -> Result<Recording, ServiceError> {
        let result = async {
            input.validate()?;
            let embed_url = generate_embed_url(&input.video_url);
            let recording = Recording::from_input(input, generate_uuid(), embed_url, Utc::now());

            let mut recordings = self.recordings_for_update().await?;
            let before = recordings.items.len();
            recordings.items.retain(|r| r.day_number != recording.day_number);
            let replaced = before - recordings.items.len();
            recordings.items.push(recording.clone());

            self.persist(session, RECORDINGS_DOC, &recordings.items, recordings.etag.as_deref()).await?;
            info!(
                event = "recording_uploaded",
                recording_id = %recording.recording_id,
                day_number = recording.day_number,
                replaced,
                "recording uploaded"
            );
            Ok::<_, ServiceError>(recording)
        }
        .await;
        log_failure("upload_recording", result)
    }

    /// Delete a recording by id. The collection is written back even when
    /// nothing matched; the return value says whether anything was removed.
    #[instrument(skip(self, session))]
    pub async fn remove_recording(&self, session: &Session, recording_id: Uuid) -> Result<bool, ServiceError> {
        let result = self
            .remove_recordings_where(session, |r| r.recording_id == recording_id)
            .await
            .map(|removed| removed > 0);
        if let Ok(removed) = &result {
            info!(event = "recording_removed", %recording_id, removed, "recording removal persisted");
        }
        log_failure("remove_recording", result)
    }

    /// Delete every recording attached to a day; returns how many went.
    #[instrument(skip(self, session))]
    pub async fn remove_recording_for_day(&self, session: &Session, day_number: u32) -> Result<usize, ServiceError> {
        let result = self.remove_recordings_where(session, |r| r.day_number == day_number).await;
        if let Ok(removed) = &result {
            info!(event = "day_recordings_removed", day_number, removed, "recordings removed for day");
        }
        log_failure("remove_recording_for_day", result)
    }

    // ---- private helpers ----

    async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Collection<T>, ServiceError> {
        let doc = self.store.get(name).await?;
        let items: Vec<T> = serde_json::from_slice(&doc.body)?;
        Ok(Collection { items, etag: doc.etag })
    }

    async fn load_days(&self) -> Result<Collection<TrainingDay>, ServiceError> {
        let days = self.load::<TrainingDay>(TRAINING_DAYS_DOC).await?;
        validate_days(&days.items)?;
        Ok(days)
    }

    async fn load_recordings(&self) -> Result<Collection<Recording>, ServiceError> {
        let recordings = self.load::<Recording>(RECORDINGS_DOC).await?;
        validate_recordings(&recordings.items)?;
        Ok(recordings)
    }

    /// Days to mutate. A document that doesn't exist yet is seeded from the
    /// built-in list; any other read failure aborts the write.
    async fn days_for_update(&self) -> Result<Collection<TrainingDay>, ServiceError> {
        match self.load_days().await {
            Ok(days) => Ok(days),
            Err(e) if e.is_missing_document() => {
                warn!("training_days.json missing, seeding from fallback list");
                Ok(Collection::unversioned(fallback::training_days()))
            }
            Err(e) => Err(e),
        }
    }

    async fn recordings_for_update(&self) -> Result<Collection<Recording>, ServiceError> {
        match self.load_recordings().await {
            Ok(recordings) => Ok(recordings),
            Err(e) if e.is_missing_document() => Ok(Collection::unversioned(Vec::new())),
            Err(e) => Err(e),
        }
    }

    async fn modify_day<F>(&self, session: &Session, day_number: u32, f: F) -> Result<TrainingDay, ServiceError>
    where
        F: FnOnce(&mut TrainingDay),
    {
        let mut days = self.days_for_update().await?;
        let day = days
            .items
            .iter_mut()
            .find(|d| d.day_number == day_number)
            .ok_or_else(|| ServiceError::NotFound(format!("day {day_number} not found")))?;
        f(day);
        let updated = day.clone();
        self.persist_days(session, &days.items, days.etag.as_deref()).await?;
        Ok(updated)
    }

    async fn remove_recordings_where<F>(&self, session: &Session, matches: F) -> Result<usize, ServiceError>
    where
        F: Fn(&Recording) -> bool,
    {
        let mut recordings = self.recordings_for_update().await?;
        let before = recordings.items.len();
        recordings.items.retain(|r| !matches(r));
        let removed = before - recordings.items.len();
        self.persist(session, RECORDINGS_DOC, &recordings.items, recordings.etag.as_deref()).await?;
        Ok(removed)
    }

    /// Embedded recordings are a read-side view and never stored with the days.
    async fn persist_days(&self, session: &Session, days: &[TrainingDay], etag: Option<&str>) -> Result<(), ServiceError> {
        let stripped: Vec<TrainingDay> = days
            .iter()
            .cloned()
            .map(|mut d| {
                d.recording = None;
                d
            })
            .collect();
        self.persist(session, TRAINING_DAYS_DOC, &stripped, etag).await
    }

    async fn persist<T: Serialize + Sync>(
        &self,
        session: &Session,
        name: &str,
        items: &[T],
        etag: Option<&str>,
    ) -> Result<(), ServiceError> {
        let body = serde_json::to_vec_pretty(items)?;
        let token = session.token().await?;
        let if_match = if self.conditional_writes { etag } else { None };
        self.store
            .put(name, body, WriteOptions { token: token.as_deref(), if_match })
            .await?;
        debug!(document = name, count = items.len(), conditional = if_match.is_some(), "collection persisted");
        Ok(())
    }
}
