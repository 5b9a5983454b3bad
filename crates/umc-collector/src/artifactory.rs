use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use umc_measure::Measurement;

use crate::client::ServiceClient;
use crate::error::CollectError;
use crate::poller::Collector;

/// Polls an Artifactory instance's storage summary and maps it onto
/// `fileStorage`, `binaries` and per-repository `repositories`
/// measurements.
pub struct ArtifactoryCollector {
    client: ServiceClient,
}

impl ArtifactoryCollector {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Collector for ArtifactoryCollector {
    fn name(&self) -> &str {
        "artifactory"
    }

    async fn collect(&self) -> Result<Vec<Measurement>, CollectError> {
        let body = self.client.get_json("/api/storagesummary").await?;
        process_statistics(&body)
    }
}

fn process_statistics(body: &serde_json::Value) -> Result<Vec<Measurement>, CollectError> {
    let mut measurements = Vec::new();

    if let Some(summary) = body.get("fileStoreSummary") {
        measurements.push(file_storage_stats(summary)?);
    }
    if let Some(summary) = body.get("binariesSummary") {
        measurements.push(binary_stats(summary)?);
    }
    if let Some(repositories) = body
        .get("repositoriesSummaryList")
        .and_then(serde_json::Value::as_array)
    {
        for repository in repositories {
            measurements.push(repository_stats(repository)?);
        }
    }

    Ok(measurements)
}

fn file_storage_stats(json: &serde_json::Value) -> Result<Measurement, CollectError> {
    Measurement::builder()
        .name("fileStorage")
        .tag("server", "artifactory")
        .value_opt("totalSpace", space_field(json, "totalSpace"))
        .value_opt("usedSpace", space_field(json, "usedSpace"))
        .value_opt("freeSpace", space_field(json, "freeSpace"))
        // Fields like "172.06 GB (84.23%)" carry both readings.
        .value_opt("freeSpacePercent", percent_field(json, "freeSpace"))
        .value_opt("usedSpacePercent", percent_field(json, "usedSpace"))
        .build()
        .map_err(Into::into)
}

fn binary_stats(json: &serde_json::Value) -> Result<Measurement, CollectError> {
    Measurement::builder()
        .name("binaries")
        .tag("server", "artifactory")
        .value_opt("binariesCount", count_field(json, "binariesCount"))
        .value_opt("itemsCount", count_field(json, "itemsCount"))
        .value_opt("artifactsCount", count_field(json, "artifactsCount"))
        .value_opt("binariesSize", space_field(json, "binariesSize"))
        .value_opt("artifactsSize", space_field(json, "artifactsSize"))
        .value_opt("optimization", percent_field(json, "optimization"))
        .build()
        .map_err(Into::into)
}

fn repository_stats(json: &serde_json::Value) -> Result<Measurement, CollectError> {
    Measurement::builder()
        .name("repositories")
        .tag("server", "artifactory")
        .tag_opt("repository", str_field(json, "repoKey"))
        .tag_opt("repoType", str_field(json, "repoType"))
        .tag_opt("packageType", str_field(json, "packageType"))
        .value("itemsCount", int_field(json, "itemsCount"))
        .value("filesCount", int_field(json, "filesCount"))
        .value("foldersCount", int_field(json, "foldersCount"))
        .value_opt("usedSpace", space_field(json, "usedSpace"))
        .value_opt("percentage", percent_field(json, "percentage"))
        .build()
        .map_err(Into::into)
}

fn str_field<'a>(json: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    json.get(field).and_then(serde_json::Value::as_str)
}

fn int_field(json: &serde_json::Value, field: &str) -> i32 {
    json.get(field)
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0) as i32
}

fn space_field(json: &serde_json::Value, field: &str) -> Option<i64> {
    str_field(json, field).and_then(parse_space)
}

fn percent_field(json: &serde_json::Value, field: &str) -> Option<f64> {
    str_field(json, field).and_then(parse_percent)
}

/// Units Artifactory renders space readings in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceUnit {
    Bytes,
    Kb,
    Mb,
    Gb,
    Tb,
}

impl SpaceUnit {
    fn multiplier(self) -> i64 {
        match self {
            SpaceUnit::Bytes => 1,
            SpaceUnit::Kb => 1024,
            SpaceUnit::Mb => 1024 * 1024,
            SpaceUnit::Gb => 1024 * 1024 * 1024,
            SpaceUnit::Tb => 1024 * 1024 * 1024 * 1024,
        }
    }

    pub fn to_bytes(self, base: f64) -> i64 {
        (base * self.multiplier() as f64) as i64
    }

    fn from_token(token: &str) -> Self {
        match token {
            "KB" => SpaceUnit::Kb,
            "MB" => SpaceUnit::Mb,
            "GB" => SpaceUnit::Gb,
            "TB" => SpaceUnit::Tb,
            _ => SpaceUnit::Bytes,
        }
    }
}

fn space_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([\d,]+(?:\.\d+)?)\s*(bytes|B|KB|MB|GB|TB)").expect("valid space pattern")
    })
}

fn percent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid percent pattern"))
}

/// Parses a rendered space reading like "3.48 GB" into bytes.
pub fn parse_space(input: &str) -> Option<i64> {
    let captures = space_pattern().captures(input)?;
    let base: f64 = captures[1].replace(',', "").parse().ok()?;
    Some(SpaceUnit::from_token(&captures[2]).to_bytes(base))
}

/// Parses a rendered percentage like "84.23%" or "172.06 GB (84.23%)".
pub fn parse_percent(input: &str) -> Option<f64> {
    let captures = percent_pattern().captures(input)?;
    captures[1].parse().ok()
}

/// Parses a grouped count like "125,726".
pub fn parse_count(input: &str) -> Option<i32> {
    input.replace(',', "").parse().ok()
}

fn count_field(json: &serde_json::Value, field: &str) -> Option<i32> {
    str_field(json, field).and_then(parse_count)
}
