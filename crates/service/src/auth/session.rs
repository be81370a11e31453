use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use super::provider::{AccessToken, AnonymousProvider, ClientCredentialsProvider, StaticTokenProvider, TokenProvider};

/// Holds the credential used for write operations.
///
/// Construct one per client lifetime and pass it by reference. The cached
/// token is renewed when it expires or when [`Session::refresh`] is called.
pub struct Session {
    provider: Arc<dyn TokenProvider>,
    cached: RwLock<Option<AccessToken>>,
}

impl Session {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider, cached: RwLock::new(None) }
    }

    /// No credential: writes go out without an `Authorization` header.
    pub fn anonymous() -> Self { Self::new(Arc::new(AnonymousProvider)) }

    /// Wrap a bearer token obtained elsewhere.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(Arc::new(StaticTokenProvider::new(token)))
    }

    /// Build a session and acquire its first token up front, so bad
    /// credentials fail at startup rather than on the first write.
    pub async fn establish(provider: Arc<dyn TokenProvider>) -> Result<Self, ServiceError> {
        let session = Self::new(provider);
        session.refresh().await?;
        Ok(session)
    }

    /// Client credentials when the identity section is complete, anonymous otherwise.
    pub async fn from_config(cfg: &configs::IdentityConfig) -> Result<Self, ServiceError> {
        match ClientCredentialsProvider::from_config(cfg)? {
            Some(provider) => Self::establish(Arc::new(provider)).await,
            None => Ok(Self::anonymous()),
        }
    }

    pub fn provider_name(&self) -> &'static str { self.provider.name() }

    /// Current bearer token, renewing it first if missing or expired.
    pub async fn token(&self) -> Result<Option<String>, ServiceError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired(Utc::now()) {
                    return Ok(Some(token.secret.clone()));
                }
            }
        }
        self.refresh().await
    }

    /// Drop the cached token and ask the provider for a new one.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn refresh(&self) -> Result<Option<String>, ServiceError> {
        let mut cached = self.cached.write().await;
        *cached = None;
        let token = self.provider.acquire().await?;
        let secret = token.as_ref().map(|t| t.secret.clone());
        if let Some(t) = &token {
            info!(event = "token_refreshed", expires_at = ?t.expires_at, "session token refreshed");
        }
        *cached = token;
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        ttl_secs: i64,
    }

    #[async_trait::async_trait]
    impl TokenProvider for CountingProvider {
        async fn acquire(&self) -> Result<Option<AccessToken>, ServiceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let expires = Utc::now() + chrono::Duration::seconds(self.ttl_secs);
            Ok(Some(AccessToken::new(format!("t{n}"), Some(expires))))
        }
        fn name(&self) -> &'static str { "counting" }
    }

    #[tokio::test]
    async fn token_is_cached_until_refresh() -> anyhow::Result<()> {
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0), ttl_secs: 3600 });
        let session = Session::establish(provider.clone()).await?;
        assert_eq!(session.token().await?.as_deref(), Some("t1"));
        assert_eq!(session.token().await?.as_deref(), Some("t1"));
        assert_eq!(session.refresh().await?.as_deref(), Some("t2"));
        assert_eq!(session.token().await?.as_deref(), Some("t2"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_is_renewed_on_use() -> anyhow::Result<()> {
        // inside the expiry skew, so every read renews
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0), ttl_secs: 10 });
        let session = Session::establish(provider.clone()).await?;
        assert_eq!(session.token().await?.as_deref(), Some("t2"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_and_static_sessions() -> anyhow::Result<()> {
        assert_eq!(Session::anonymous().token().await?, None);
        let unconfigured = Session::from_config(&configs::IdentityConfig::default()).await?;
        assert_eq!(unconfigured.provider_name(), "anonymous");
        let s = Session::with_token("bearer-123");
        assert_eq!(s.token().await?.as_deref(), Some("bearer-123"));
        assert_eq!(s.provider_name(), "static");
        Ok(())
    }
}
