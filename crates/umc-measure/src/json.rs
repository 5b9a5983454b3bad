use bytes::Bytes;
use serde_json::json;

use crate::codec::{Decoder, Encoder};
use crate::error::MalformedBufferError;
use crate::measurement::Measurement;

/// JSON rendition of a measurement batch: an array of
/// `{name, timestamp, tags, values}` objects.
///
/// Unlike [`crate::BinaryCodec`], the JSON form does not preserve numeric
/// width: floats come back as doubles and integers that fit 32 bits come
/// back as such. Use the binary codec where type fidelity matters.
pub struct JsonCodec;

impl Encoder for JsonCodec {
    fn encode(&self, measurements: &[Measurement]) -> Bytes {
        let doc = serde_json::Value::Array(
            measurements
                .iter()
                .map(|m| {
                    json!({
                        "name": m.name(),
                        "timestamp": m.timestamp(),
                        "tags": m.tags(),
                        "values": m.values(),
                    })
                })
                .collect(),
        );
        Bytes::from(doc.to_string().into_bytes())
    }
}

impl Decoder for JsonCodec {
    fn decode(&self, buf: &[u8]) -> Result<Vec<Measurement>, MalformedBufferError> {
        let doc: serde_json::Value = serde_json::from_slice(buf)
            .map_err(|e| MalformedBufferError::InvalidJson(e.to_string()))?;

        let entries = doc.as_array().ok_or_else(|| {
            MalformedBufferError::InvalidJson("expected a top-level array".to_string())
        })?;

        entries.iter().map(decode_entry).collect()
    }
}

fn decode_entry(entry: &serde_json::Value) -> Result<Measurement, MalformedBufferError> {
    let obj = entry.as_object().ok_or_else(|| {
        MalformedBufferError::InvalidJson("expected an object per measurement".to_string())
    })?;

    let mut builder = Measurement::builder();

    if let Some(name) = obj.get("name").and_then(serde_json::Value::as_str) {
        builder = builder.name(name);
    }

    let timestamp = obj
        .get("timestamp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| {
            MalformedBufferError::InvalidJson("timestamp missing or not an integer".to_string())
        })?;
    builder = builder.timestamp(timestamp);

    let tags = obj
        .get("tags")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| MalformedBufferError::InvalidJson("tags object missing".to_string()))?;
    for (key, value) in tags {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        builder = builder.tag(key.as_str(), rendered);
    }

    let values = obj
        .get("values")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| MalformedBufferError::InvalidJson("values object missing".to_string()))?;
    for (key, value) in values {
        builder = builder.raw_value(key.as_str(), value)?;
    }

    Ok(builder.build()?)
}
