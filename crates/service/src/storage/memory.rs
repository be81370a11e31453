use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ServiceError;
use super::{Document, DocumentStore, WriteOptions};

#[derive(Default)]
struct Inner {
    docs: HashMap<String, (Vec<u8>, u64)>,
    writes: Vec<String>,
    unavailable: bool,
}

/// In-process document store for tests and offline use.
///
/// ETags are the per-document version counter, so `If-Match` behaves like the
/// HTTP store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Seed a document from any serializable value.
    pub fn with_document<T: Serialize>(self, name: &str, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        self.insert_raw(name, body);
        self
    }

    pub fn insert_raw(&self, name: &str, body: Vec<u8>) {
        let mut inner = self.lock();
        let version = inner.docs.get(name).map(|(_, v)| v + 1).unwrap_or(1);
        inner.docs.insert(name.to_string(), (body, version));
    }

    /// Make every call fail as if the network were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Names of documents written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub fn document_json(&self, name: &str) -> Option<serde_json::Value> {
        let inner = self.lock();
        inner.docs.get(name).and_then(|(body, _)| serde_json::from_slice(body).ok())
    }

    pub fn document_text(&self, name: &str) -> Option<String> {
        let inner = self.lock();
        inner.docs.get(name).map(|(body, _)| String::from_utf8_lossy(body).into_owned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // a poisoned lock only means a test panicked mid-write; the map is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn etag(version: u64) -> String { format!("\"{version}\"") }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Document, ServiceError> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(ServiceError::Transport("store unavailable".into()));
        }
        match inner.docs.get(name) {
            Some((body, version)) => Ok(Document { body: body.clone(), etag: Some(Self::etag(*version)) }),
            None => Err(ServiceError::Status { status: 404, message: format!("{name} does not exist") }),
        }
    }

    async fn put(&self, name: &str, body: Vec<u8>, opts: WriteOptions<'_>) -> Result<Option<String>, ServiceError> {
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(ServiceError::Transport("store unavailable".into()));
        }
        let current = inner.docs.get(name).map(|(_, v)| *v);
        if let Some(expected) = opts.if_match {
            if current.map(Self::etag).as_deref() != Some(expected) {
                return Err(ServiceError::Conflict(format!("{name} changed since it was read")));
            }
        }
        let version = current.map(|v| v + 1).unwrap_or(1);
        inner.docs.insert(name.to_string(), (body, version));
        inner.writes.push(name.to_string());
        Ok(Some(Self::etag(version)))
    }
}
