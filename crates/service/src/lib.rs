//! Service layer for the training portal.
//! - `storage`: whole-document GET/PUT against the data-lake file store.
//! - `portal`: training day and recording operations on top of a store.
//! - `auth`: bearer-token sessions for write paths.
//! - `sql`: the query-backed pathway.

pub mod errors;
pub mod auth;
pub mod storage;
pub mod portal;
pub mod embed;
pub mod ids;
pub mod sql;
pub mod export;
#[cfg(test)]
pub mod test_support;

pub use portal::PortalClient;
