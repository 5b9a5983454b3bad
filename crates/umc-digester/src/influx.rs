use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use umc_measure::{Encoder, Measurement};

use crate::error::TransportError;
use crate::line::LineCodec;

/// Connection settings for the time-series backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Target database for all writes.
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_database() -> String {
    "metrics".to_string()
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
        }
    }
}

/// Write client for the backend's HTTP ingest endpoint.
pub struct InfluxClient {
    http: reqwest::Client,
    write_url: String,
    database: String,
}

impl InfluxClient {
    pub fn new(http: reqwest::Client, config: &InfluxConfig) -> Self {
        Self {
            http,
            write_url: format!("http://{}:{}/write", config.host, config.port),
            database: config.database.clone(),
        }
    }

    /// Writes a batch in the line text format. The backend acknowledges
    /// with 204 No Content; any other status is a failure.
    pub async fn send(&self, measurements: &[Measurement]) -> Result<(), TransportError> {
        let body = LineCodec.encode(measurements);
        let response = self
            .http
            .post(&self.write_url)
            .query(&[("db", self.database.as_str())])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Rejected { status, body })
        }
    }

    #[cfg(test)]
    pub(crate) fn write_url(&self) -> &str {
        &self.write_url
    }
}
