use std::path::Path;

use serde::{Deserialize, Serialize};

use umc_collector::CollectorConfig;
use umc_digester::InfluxConfig;
use umc_logging::LogConfig;

/// Top-level daemon configuration, loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub influx: InfluxConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }
}
