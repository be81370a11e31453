use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl Health {
    pub fn ok(version: &str) -> Self {
        Self { status: "ok".into(), version: version.into() }
    }
}

/// Banner returned by the root endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub health: String,
}
