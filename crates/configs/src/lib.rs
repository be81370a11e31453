use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_WORKSPACE_NAME: &str = "MS-Fabric-Learn";
pub const DEFAULT_LAKEHOUSE_NAME: &str = "Learning_LH";
pub const DEFAULT_DATA_FOLDER: &str = "TrainingData";
pub const DEFAULT_ONELAKE_HOST: &str = "https://onelake.dfs.fabric.microsoft.com";
pub const DEFAULT_API_VERSION: &str = "2023-11-03";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub sql: SqlConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
    /// Keys accepted on write routes (`X-API-Key` or bearer).
    pub admin_api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8000, worker_threads: Some(4), admin_api_keys: Vec::new() }
    }
}

/// Location of the JSON documents in the data-lake file store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Full base URL of the folder holding the documents. Derived from the
    /// workspace/lakehouse names when empty.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_workspace_name")]
    pub workspace_name: String,
    #[serde(default = "default_lakehouse_name")]
    pub lakehouse_name: String,
    #[serde(default = "default_data_folder")]
    pub data_folder: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Send `If-Match` with the ETag observed on read.
    #[serde(default = "default_true")]
    pub conditional_writes: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            workspace_name: default_workspace_name(),
            lakehouse_name: default_lakehouse_name(),
            data_folder: default_data_folder(),
            api_version: default_api_version(),
            conditional_writes: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// OAuth2 client-credentials identity. All three ids must be set together.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority: default_authority(),
            scope: default_scope(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SqlConfig {
    /// Query endpoint; the SQL pathway is disabled when empty.
    #[serde(default)]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

fn default_workspace_name() -> String { DEFAULT_WORKSPACE_NAME.into() }
fn default_lakehouse_name() -> String { DEFAULT_LAKEHOUSE_NAME.into() }
fn default_data_folder() -> String { DEFAULT_DATA_FOLDER.into() }
fn default_api_version() -> String { DEFAULT_API_VERSION.into() }
fn default_true() -> bool { true }
fn default_request_timeout() -> u64 { 30 }
fn default_authority() -> String { "https://login.microsoftonline.com".into() }
fn default_scope() -> String { "https://storage.azure.com/.default".into() }
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:8000".into(),
        "http://127.0.0.1:3000".into(),
        "https://sahils1997.github.io".into(),
    ]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is missing, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Apply overrides from `lookup` (normally the process environment) and validate.
    pub fn normalize_and_validate<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize(&lookup)?;
        self.store.normalize(&lookup);
        self.store.validate()?;
        self.identity.normalize(&lookup);
        self.identity.validate()?;
        self.sql.normalize(&lookup);
        self.sql.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

impl ServerConfig {
    fn normalize<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) -> Result<()> {
        if let Some(host) = non_empty(lookup("SERVER_HOST")) {
            self.host = host;
        }
        if let Some(port) = non_empty(lookup("SERVER_PORT")) {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT is not a valid port: {port}"))?;
        }
        if let Some(keys) = non_empty(lookup("ADMIN_API_KEYS")) {
            self.admin_api_keys = keys.split(',').map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect();
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn normalize<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(name) = non_empty(lookup("FABRIC_WORKSPACE_NAME")) {
            self.workspace_name = name;
        }
        if let Some(name) = non_empty(lookup("FABRIC_LAKEHOUSE_NAME")) {
            self.lakehouse_name = name;
        }
        if let Some(url) = non_empty(lookup("ONELAKE_BASE_URL")) {
            self.base_url = url;
        }
        if self.base_url.trim().is_empty() {
            self.base_url = format!(
                "{}/{}/{}.Lakehouse/Files/{}",
                DEFAULT_ONELAKE_HOST, self.workspace_name, self.lakehouse_name, self.data_folder
            );
        }
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!("store.base_url is empty"));
        }
        if !is_http_url(&self.base_url) {
            return Err(anyhow!("store.base_url must start with http:// or https://"));
        }
        if self.api_version.trim().is_empty() {
            return Err(anyhow!("store.api_version is empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("store.request_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}

impl IdentityConfig {
    pub fn normalize<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(v) = non_empty(lookup("AZURE_TENANT_ID")) { self.tenant_id = v; }
        if let Some(v) = non_empty(lookup("AZURE_CLIENT_ID")) { self.client_id = v; }
        if let Some(v) = non_empty(lookup("AZURE_CLIENT_SECRET")) { self.client_secret = v; }
    }

    /// True when client credentials are fully configured.
    pub fn is_configured(&self) -> bool {
        !self.tenant_id.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let set = [&self.tenant_id, &self.client_id, &self.client_secret]
            .iter()
            .filter(|v| !v.trim().is_empty())
            .count();
        if set != 0 && set != 3 {
            return Err(anyhow!("identity requires tenant_id, client_id and client_secret together"));
        }
        if !is_http_url(&self.authority) {
            return Err(anyhow!("identity.authority must start with http:// or https://"));
        }
        Ok(())
    }
}

impl SqlConfig {
    pub fn normalize<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(v) = non_empty(lookup("FABRIC_SQL_ENDPOINT")) { self.endpoint = v; }
    }

    pub fn is_enabled(&self) -> bool { !self.endpoint.trim().is_empty() }

    pub fn validate(&self) -> Result<()> {
        if self.is_enabled() && !is_http_url(&self.endpoint) {
            return Err(anyhow!("sql.endpoint must start with http:// or https://"));
        }
        Ok(())
    }
}
