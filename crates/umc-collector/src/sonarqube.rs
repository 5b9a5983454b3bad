use std::collections::BTreeMap;

use async_trait::async_trait;

use umc_measure::Measurement;

use crate::client::ServiceClient;
use crate::error::CollectError;
use crate::poller::Collector;

const SEVERITIES: [&str; 4] = ["BLOCKER", "CRITICAL", "MAJOR", "MINOR"];

/// Polls a SonarQube server for open issue counts per severity, compute
/// engine activity and component totals.
pub struct SonarqubeCollector {
    client: ServiceClient,
}

impl SonarqubeCollector {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Collector for SonarqubeCollector {
    fn name(&self) -> &str {
        "sonarqube"
    }

    async fn collect(&self) -> Result<Vec<Measurement>, CollectError> {
        let mut measurements = Vec::new();

        for severity in SEVERITIES {
            let body = self
                .client
                .get_json(&format!("/api/issues/search?ps=1&severities={severity}"))
                .await?;
            measurements.push(issue_count(severity, &body)?);
        }

        let activity = self.client.get_json("/api/ce/activity").await?;
        measurements.extend(task_measurements(&activity)?);

        let components = self
            .client
            .get_json("/api/components/search?qualifiers=BRC,DIR,FIL,TRK,UTS&ps=100000")
            .await?;
        measurements.extend(component_counts(&components)?);

        Ok(measurements)
    }
}

fn issue_count(severity: &str, body: &serde_json::Value) -> Result<Measurement, CollectError> {
    let total = body
        .get("total")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0) as i32;

    Measurement::builder()
        .name("issues")
        .tag("severity", severity)
        .value("count", total)
        .build()
        .map_err(Into::into)
}

fn task_measurements(body: &serde_json::Value) -> Result<Vec<Measurement>, CollectError> {
    let Some(tasks) = body.get("tasks").and_then(serde_json::Value::as_array) else {
        return Ok(Vec::new());
    };

    tasks
        .iter()
        .map(|task| {
            let execution_time = task
                .get("executionTimeMs")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0) as i32;

            Measurement::builder()
                .name("tasks")
                .tag_opt("type", str_field(task, "type"))
                .tag_opt("component", str_field(task, "componentKey"))
                .tag_opt("status", str_field(task, "status"))
                .tag_opt("submitter", str_field(task, "submitterLogin"))
                .value("executionTime", execution_time)
                .build()
                .map_err(Into::into)
        })
        .collect()
}

fn component_counts(body: &serde_json::Value) -> Result<Vec<Measurement>, CollectError> {
    let Some(components) = body.get("components").and_then(serde_json::Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut counts: BTreeMap<&'static str, i32> = BTreeMap::new();
    for component in components {
        let kind = component
            .get("qualifier")
            .and_then(serde_json::Value::as_str)
            .map(map_component_qualifier)
            .unwrap_or("unknown");
        *counts.entry(kind).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(kind, count)| {
            Measurement::builder()
                .name("components")
                .tag("type", kind)
                .value("count", count)
                .build()
                .map_err(Into::into)
        })
        .collect()
}

fn map_component_qualifier(qualifier: &str) -> &'static str {
    match qualifier {
        "TRK" => "projects",
        "BRC" => "branches",
        "DIR" => "directories",
        "FIL" => "files",
        "UTS" => "tests",
        _ => "unknown",
    }
}

fn str_field<'a>(json: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    json.get(field).and_then(serde_json::Value::as_str)
}
