//! Credentials for write paths.
//!
//! A [`Session`] is built once by the caller around a [`TokenProvider`] and
//! handed to every write operation. Reads never need it.

pub mod provider;
pub mod session;

pub use provider::{AccessToken, AnonymousProvider, ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
pub use session::Session;
