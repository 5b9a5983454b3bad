use async_trait::async_trait;
use bytes::Bytes;

use umc_bus::Subscriber;
use umc_measure::{BinaryCodec, Decoder};

use crate::influx::InfluxClient;

/// Bus consumer that decodes published measurement batches and forwards
/// them to the time-series backend.
///
/// A payload that fails to decode is logged and dropped; the bytes are not
/// recoverable and a retry cannot fix them. Write failures are likewise
/// reported here and nowhere else; neither kind of failure reaches the
/// publisher or other consumers.
pub struct InfluxDigester {
    client: InfluxClient,
}

impl InfluxDigester {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Subscriber for InfluxDigester {
    async fn on_message(&self, payload: Bytes) {
        let measurements = match BinaryCodec.decode(&payload) {
            Ok(ms) => ms,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bytes = payload.len(),
                    "dropping undecodable measurement batch"
                );
                return;
            }
        };
        if measurements.is_empty() {
            return;
        }

        match self.client.send(&measurements).await {
            Ok(()) => {
                tracing::debug!(count = measurements.len(), "stored measurements");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    count = measurements.len(),
                    "failed to store measurements"
                );
            }
        }
    }
}
