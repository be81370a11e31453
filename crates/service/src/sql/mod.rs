//! Query-backed pathway.
//!
//! Sends parameterized statements to the lakehouse SQL endpoint as
//! `{"query": ..., "parameters": {...}}` and decodes the `rows` of the reply.
//! Parameters are referenced as `@name` in the statement text.

use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use models::user::validate_email;
use models::{Recording, TrainingDay, User};

use crate::auth::Session;
use crate::errors::ServiceError;

pub mod statements;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    parameters: &'a Value,
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
}

/// Client for the lakehouse SQL endpoint.
#[derive(Clone)]
pub struct QueryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl QueryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }

    /// `None` when no SQL endpoint is configured.
    pub fn from_config(cfg: &configs::SqlConfig) -> Result<Option<Self>, ServiceError> {
        if !cfg.is_enabled() {
            return Ok(None);
        }
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Some(Self::with_client(http, cfg.endpoint.clone())))
    }

    /// Run one statement and decode its rows.
    #[instrument(skip(self, session, parameters))]
    pub async fn query<T: DeserializeOwned>(
        &self,
        session: &Session,
        sql: &str,
        parameters: Value,
    ) -> Result<Vec<T>, ServiceError> {
        if !(parameters.is_object() || parameters.is_null()) {
            return Err(ServiceError::Validation("query parameters must be a JSON object".into()));
        }
        let body = QueryRequest { query: sql, parameters: &parameters };
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = session.token().await? {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status: status.as_u16(), message });
        }
        let decoded: QueryResponse<T> = response.json().await?;
        debug!(rows = decoded.rows.len(), "query returned");
        Ok(decoded.rows)
    }

    // ---- reads: failures are logged and come back empty ----

    pub async fn list_users(&self, session: &Session) -> Vec<User> {
        self.query(session, statements::LIST_USERS, json!({}))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "list_users failed");
                Vec::new()
            })
    }

    pub async fn find_user_by_email(&self, session: &Session, email: &str) -> Option<User> {
        if validate_email(email).is_err() {
            return None;
        }
        let rows: Vec<User> = self
            .query(session, statements::FIND_USER_BY_EMAIL, json!({ "email": email.trim().to_lowercase() }))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "find_user_by_email failed");
                Vec::new()
            });
        rows.into_iter().next()
    }

    pub async fn active_recordings(&self, session: &Session) -> Vec<Recording> {
        self.query(session, statements::ACTIVE_RECORDINGS, json!({}))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "active_recordings failed");
                Vec::new()
            })
    }

    // ---- writes ----

    pub async fn unlock_day(&self, session: &Session, day_number: u32, actor: &str) -> Result<TrainingDay, ServiceError> {
        let params = json!({
            "dayNumber": day_number,
            "unlockedAt": Utc::now(),
            "unlockedBy": actor,
        });
        self.update_day(session, statements::UNLOCK_DAY, day_number, params).await
    }

    pub async fn lock_day(&self, session: &Session, day_number: u32) -> Result<TrainingDay, ServiceError> {
        self.update_day(session, statements::LOCK_DAY, day_number, json!({ "dayNumber": day_number }))
            .await
    }

    /// Soft delete: the row stays, flagged inactive. Returns whether a row matched.
    pub async fn deactivate_recording(&self, session: &Session, recording_id: Uuid) -> Result<bool, ServiceError> {
        let rows: Vec<Value> = self
            .query(session, statements::DEACTIVATE_RECORDING, json!({ "recordingId": recording_id }))
            .await
            .inspect_err(|e| error!(error = %e, %recording_id, "deactivate_recording failed"))?;
        Ok(!rows.is_empty())
    }

    async fn update_day(&self, session: &Session, sql: &str, day_number: u32, params: Value) -> Result<TrainingDay, ServiceError> {
        let rows: Vec<TrainingDay> = self
            .query(session, sql, params)
            .await
            .inspect_err(|e| error!(error = %e, day_number, "day update failed"))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("day {day_number} not found")))
    }
}
