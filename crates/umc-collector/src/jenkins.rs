use async_trait::async_trait;

use umc_measure::Measurement;

use crate::client::ServiceClient;
use crate::error::CollectError;
use crate::poller::Collector;

/// The executor/queue gauges exposed by Jenkins' overall-load API.
const LOAD_KEYS: [&str; 9] = [
    "availableExecutors",
    "busyExecutors",
    "connectingExecutors",
    "definedExecutors",
    "idleExecutors",
    "onlineExecutors",
    "queueLength",
    "totalExecutors",
    "totalQueueLength",
];

/// Polls a Jenkins controller's overall load statistics into a single
/// `loadStats` measurement.
pub struct JenkinsCollector {
    client: ServiceClient,
}

impl JenkinsCollector {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Collector for JenkinsCollector {
    fn name(&self) -> &str {
        "jenkins"
    }

    async fn collect(&self) -> Result<Vec<Measurement>, CollectError> {
        let body = self.client.get_json("/overallLoad/api/json?depth=2").await?;
        Ok(vec![map_load_stats(&body)?])
    }
}

fn map_load_stats(body: &serde_json::Value) -> Result<Measurement, CollectError> {
    let mut builder = Measurement::builder().name("loadStats");
    for key in LOAD_KEYS {
        builder = builder.value_opt(key, latest_value(body, key));
    }
    builder.build().map_err(Into::into)
}

/// Each gauge is a time series; the most recent minute-resolution reading
/// sits at `<key>.min.latest`.
fn latest_value(body: &serde_json::Value, key: &str) -> Option<f32> {
    body.get(key)?
        .get("min")?
        .get("latest")?
        .as_f64()
        .map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use umc_measure::Value;

    fn gauge(latest: f64) -> serde_json::Value {
        serde_json::json!({ "min": { "latest": latest } })
    }

    #[test]
    fn test_map_load_stats() {
        let body = serde_json::json!({
            "availableExecutors": gauge(0.0),
            "busyExecutors": gauge(2.0),
            "connectingExecutors": gauge(0.0),
            "definedExecutors": gauge(4.0),
            "idleExecutors": gauge(2.0),
            "onlineExecutors": gauge(4.0),
            "queueLength": gauge(1.5),
            "totalExecutors": gauge(4.0),
            "totalQueueLength": gauge(1.5),
        });

        let m = map_load_stats(&body).unwrap();
        assert_eq!(m.name(), "loadStats");
        assert_eq!(m.values().len(), 9);
        assert_eq!(m.values().get("busyExecutors"), Some(&Value::Float(2.0)));
        assert_eq!(m.values().get("queueLength"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_absent_gauges_are_omitted() {
        let body = serde_json::json!({
            "busyExecutors": gauge(1.0),
        });

        let m = map_load_stats(&body).unwrap();
        assert_eq!(m.values().len(), 1);
        assert!(!m.values().contains_key("queueLength"));
    }

    #[test]
    fn test_empty_body_fails_validation() {
        let result = map_load_stats(&serde_json::json!({}));
        assert!(matches!(result, Err(CollectError::Validation(_))));
    }
}
