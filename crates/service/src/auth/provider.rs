use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::ServiceError;

/// Bearer token plus its expiry, when the issuer reported one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Tokens are renewed this long before the issuer's expiry.
    const EXPIRY_SKEW_SECS: i64 = 60;

    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { secret: secret.into(), expires_at }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => at - chrono::Duration::seconds(Self::EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }
}

/// Source of bearer tokens. `Ok(None)` means "no credential", which is valid
/// for public read access.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self) -> Result<Option<AccessToken>, ServiceError>;
    fn name(&self) -> &'static str;
}

/// Never yields a token.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousProvider;

#[async_trait]
impl TokenProvider for AnonymousProvider {
    async fn acquire(&self) -> Result<Option<AccessToken>, ServiceError> { Ok(None) }
    fn name(&self) -> &'static str { "anonymous" }
}

/// A token obtained elsewhere (e.g. an interactive sign-in) and passed in as-is.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self { Self { token: token.into() } }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn acquire(&self) -> Result<Option<AccessToken>, ServiceError> {
        if self.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(AccessToken::new(self.token.clone(), None)))
    }
    fn name(&self) -> &'static str { "static" }
}

/// OAuth2 client-credentials grant against a Microsoft identity authority.
pub struct ClientCredentialsProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl ClientCredentialsProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
        }
    }

    /// `None` when the identity section is not configured.
    pub fn from_config(cfg: &configs::IdentityConfig) -> Result<Option<Self>, ServiceError> {
        if !cfg.is_configured() {
            return Ok(None);
        }
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        let token_url = format!("{}/{}/oauth2/v2.0/token", cfg.authority.trim_end_matches('/'), cfg.tenant_id);
        Ok(Some(Self::new(http, token_url, cfg.client_id.clone(), cfg.client_secret.clone(), cfg.scope.clone())))
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    async fn acquire(&self) -> Result<Option<AccessToken>, ServiceError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Auth(format!("token endpoint returned {}: {}", status.as_u16(), body)));
        }
        let token: TokenResponse = response.json().await.map_err(|e| ServiceError::Auth(e.to_string()))?;
        let expires_at = token.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        debug!(expires_at = ?expires_at, "access token acquired");
        Ok(Some(AccessToken::new(token.access_token, expires_at)))
    }

    fn name(&self) -> &'static str { "client_credentials" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeLake;

    #[test]
    fn expiry_includes_skew() {
        let now = Utc::now();
        assert!(!AccessToken::new("t", None).is_expired(now));
        assert!(AccessToken::new("t", Some(now + chrono::Duration::seconds(30))).is_expired(now));
        assert!(!AccessToken::new("t", Some(now + chrono::Duration::seconds(600))).is_expired(now));
    }

    #[tokio::test]
    async fn static_and_anonymous_providers() -> anyhow::Result<()> {
        assert_eq!(AnonymousProvider.acquire().await?, None);
        assert_eq!(StaticTokenProvider::new("  ").acquire().await?, None);
        let t = StaticTokenProvider::new("abc").acquire().await?.unwrap();
        assert_eq!(t.secret, "abc");
        assert!(t.expires_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn client_credentials_round_trip() -> anyhow::Result<()> {
        let lake = FakeLake::start().await?;
        let provider = ClientCredentialsProvider::new(
            reqwest::Client::new(),
            lake.token_url(),
            "client",
            "secret",
            "https://storage.azure.com/.default",
        );
        let token = provider.acquire().await?.expect("token");
        assert_eq!(token.secret, "tok-1");
        assert!(token.expires_at.is_some());

        let forms = lake.token_requests();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].get("grant_type").map(String::as_str), Some("client_credentials"));
        assert_eq!(forms[0].get("scope").map(String::as_str), Some("https://storage.azure.com/.default"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_secret_is_an_auth_error() -> anyhow::Result<()> {
        let lake = FakeLake::start().await?;
        let provider =
            ClientCredentialsProvider::new(reqwest::Client::new(), lake.token_url(), "client", "wrong", "scope");
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(_)), "{err}");
        Ok(())
    }

    #[test]
    fn from_config_builds_tenant_token_url() {
        let mut cfg = configs::IdentityConfig::default();
        assert!(ClientCredentialsProvider::from_config(&cfg).unwrap().is_none());
        cfg.tenant_id = "tenant".into();
        cfg.client_id = "id".into();
        cfg.client_secret = "secret".into();
        let p = ClientCredentialsProvider::from_config(&cfg).unwrap().unwrap();
        assert_eq!(p.token_url, "https://login.microsoftonline.com/tenant/oauth2/v2.0/token");
    }
}
