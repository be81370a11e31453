//! Storage abstractions for the service layer
//!
//! A document store holds whole JSON files addressed by name. Reads return the
//! raw body plus the store's ETag; writes replace the file in full.

use async_trait::async_trait;

use crate::errors::ServiceError;

pub mod memory;
pub mod onelake;

pub use memory::MemoryStore;
pub use onelake::OneLakeStore;

pub const TRAINING_DAYS_DOC: &str = "training_days.json";
pub const RECORDINGS_DOC: &str = "recordings.json";

/// Raw document as returned by a store.
#[derive(Debug, Clone)]
pub struct Document {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// Credential and precondition attached to a write.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions<'a> {
    /// Bearer token; the `Authorization` header is omitted when `None`.
    pub token: Option<&'a str>,
    /// ETag the current document must still have (`If-Match`).
    pub if_match: Option<&'a str>,
}

/// Whole-document store abstraction.
/// Implementations can be the OneLake HTTP API or an in-process map.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. A missing document is `ServiceError::Status { status: 404, .. }`.
    async fn get(&self, name: &str) -> Result<Document, ServiceError>;

    /// Replace a document; returns the new ETag when the store reports one.
    async fn put(&self, name: &str, body: Vec<u8>, opts: WriteOptions<'_>) -> Result<Option<String>, ServiceError>;
}
