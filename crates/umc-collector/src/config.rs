use serde::{Deserialize, Serialize};

/// Configuration for the polling side: the default poll interval and the
/// set of target servers per service kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Default poll interval in milliseconds, applied to every target that
    /// does not override it.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default)]
    pub artifactory: Vec<ServerConfig>,

    #[serde(default)]
    pub jenkins: Vec<ServerConfig>,

    #[serde(default)]
    pub sonarqube: Vec<ServerConfig>,
}

/// One polled target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix under which the service is mounted.
    #[serde(default = "default_context_root")]
    pub context_root: String,

    /// Pre-built Authorization header value, e.g. from
    /// [`crate::client::basic`].
    #[serde(default)]
    pub auth: Option<String>,

    /// Per-target override of the default poll interval.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_context_root() -> String {
    "/".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            artifactory: Vec::new(),
            jenkins: Vec::new(),
            sonarqube: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            context_root: default_context_root(),
            auth: None,
            interval_ms: None,
        }
    }
}

impl CollectorConfig {
    /// Effective poll interval for one target.
    pub fn interval_for(&self, server: &ServerConfig) -> std::time::Duration {
        std::time::Duration::from_millis(server.interval_ms.unwrap_or(self.interval_ms))
    }
}
