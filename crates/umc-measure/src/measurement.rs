use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;

use crate::error::{UnsupportedTypeError, ValidationError};

/// A single typed measurement value.
///
/// Exactly six kinds are supported; everything else must be rejected before
/// it reaches a [`Measurement`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Whether the line text format marks this value with the integer suffix.
    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Long(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A named collection of typed values sampled at one point in time, with
/// tags for classification.
///
/// Built exclusively through [`Measurement::builder`]; once built it is a
/// frozen value. Tags and values are kept in lexicographic key order so
/// that two measurements with identical content encode identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    name: String,
    /// Nanoseconds since the Unix epoch.
    timestamp: i64,
    tags: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl Measurement {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The point in time of this measurement in nanoseconds since the epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

/// Accumulates measurement parts and validates them at a single
/// [`build`](Builder::build) call.
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<String>,
    timestamp: i64,
    tags: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl Builder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Timestamp in nanoseconds since the epoch. Leaving it at 0 lets
    /// `build` substitute the current wall-clock time.
    pub fn timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = nanos;
        self
    }

    /// Duplicate keys overwrite.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Records the tag only when a value is present.
    pub fn tag_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.tag(key, v),
            None => self,
        }
    }

    /// Duplicate keys overwrite.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Records the value only when one is present; an absent value leaves
    /// the key unrecorded.
    pub fn value_opt<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.value(key, v),
            None => self,
        }
    }

    /// Generic setter for the decode path: maps a raw JSON value onto one of
    /// the six supported kinds. Nulls leave the key unrecorded; arrays and
    /// objects are rejected.
    pub fn raw_value(
        self,
        key: impl Into<String>,
        raw: &serde_json::Value,
    ) -> Result<Self, UnsupportedTypeError> {
        use serde_json::Value as Json;

        let value = match raw {
            Json::Null => return Ok(self),
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Integer(small),
                        Err(_) => Value::Long(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    Value::Double(f)
                } else {
                    return Err(UnsupportedTypeError::new("integer out of i64 range"));
                }
            }
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(_) => return Err(UnsupportedTypeError::new("array")),
            Json::Object(_) => return Err(UnsupportedTypeError::new("object")),
        };
        Ok(self.value(key, value))
    }

    /// Validates the collected parameters and freezes them into a
    /// [`Measurement`].
    pub fn build(self) -> Result<Measurement, ValidationError> {
        let name = match self.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(ValidationError::NameNotSet),
        };
        if self.timestamp < 0 {
            return Err(ValidationError::NegativeTimestamp(self.timestamp));
        }
        if self.values.is_empty() {
            return Err(ValidationError::NoValues);
        }

        let timestamp = if self.timestamp == 0 {
            Utc::now().timestamp_millis() * 1_000_000
        } else {
            self.timestamp
        };

        Ok(Measurement {
            name,
            timestamp,
            tags: self.tags,
            values: self.values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_minimal() {
        let m = Measurement::builder()
            .name("cpu")
            .timestamp(123)
            .value("load", 0.5f64)
            .build()
            .unwrap();

        assert_eq!(m.name(), "cpu");
        assert_eq!(m.timestamp(), 123);
        assert!(m.tags().is_empty());
        assert_eq!(m.values().get("load"), Some(&Value::Double(0.5)));
    }

    #[test]
    fn test_build_without_name_fails() {
        let result = Measurement::builder().timestamp(1).value("v", 1i32).build();
        assert!(matches!(result, Err(ValidationError::NameNotSet)));
    }

    #[test]
    fn test_build_blank_name_fails() {
        let result = Measurement::builder()
            .name("   ")
            .timestamp(1)
            .value("v", 1i32)
            .build();
        assert!(matches!(result, Err(ValidationError::NameNotSet)));
    }

    #[test]
    fn test_build_negative_timestamp_fails() {
        let result = Measurement::builder()
            .name("m")
            .timestamp(-1)
            .value("v", 1i32)
            .build();
        assert!(matches!(result, Err(ValidationError::NegativeTimestamp(-1))));
    }

    #[test]
    fn test_build_without_values_fails() {
        let result = Measurement::builder().name("m").timestamp(1).build();
        assert!(matches!(result, Err(ValidationError::NoValues)));
    }

    #[test]
    fn test_zero_timestamp_defaults_to_now() {
        let before = Utc::now().timestamp_millis() * 1_000_000;
        let m = Measurement::builder()
            .name("m")
            .value("v", 1i32)
            .build()
            .unwrap();
        assert!(m.timestamp() >= before);
    }

    #[test]
    fn test_tags_are_sorted_by_key() {
        let m = Measurement::builder()
            .name("m")
            .timestamp(1)
            .tag("zebra", "z")
            .tag("alpha", "a")
            .tag("mid", "m")
            .value("v", 1i32)
            .build()
            .unwrap();

        let keys: Vec<&str> = m.tags().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zebra"]);
    }

    #[test]
    fn test_duplicate_tag_overwrites() {
        let m = Measurement::builder()
            .name("m")
            .timestamp(1)
            .tag("host", "old")
            .tag("host", "new")
            .value("v", 1i32)
            .build()
            .unwrap();
        assert_eq!(m.tags().get("host").map(String::as_str), Some("new"));
    }

    #[test]
    fn test_opt_setters_skip_absent_values() {
        let m = Measurement::builder()
            .name("m")
            .timestamp(1)
            .tag_opt("present", Some("yes"))
            .tag_opt("absent", None::<String>)
            .value_opt("recorded", Some(1i32))
            .value_opt("skipped", None::<i32>)
            .build()
            .unwrap();

        assert!(m.tags().contains_key("present"));
        assert!(!m.tags().contains_key("absent"));
        assert!(m.values().contains_key("recorded"));
        assert!(!m.values().contains_key("skipped"));
    }

    #[test]
    fn test_raw_value_maps_json_kinds() {
        let b = Measurement::builder()
            .name("m")
            .timestamp(1)
            .raw_value("int", &serde_json::json!(42))
            .unwrap()
            .raw_value("long", &serde_json::json!(5_000_000_000i64))
            .unwrap()
            .raw_value("double", &serde_json::json!(0.25))
            .unwrap()
            .raw_value("flag", &serde_json::json!(true))
            .unwrap()
            .raw_value("text", &serde_json::json!("hi"))
            .unwrap()
            .raw_value("nothing", &serde_json::Value::Null)
            .unwrap();

        let m = b.build().unwrap();
        assert_eq!(m.values().get("int"), Some(&Value::Integer(42)));
        assert_eq!(m.values().get("long"), Some(&Value::Long(5_000_000_000)));
        assert_eq!(m.values().get("double"), Some(&Value::Double(0.25)));
        assert_eq!(m.values().get("flag"), Some(&Value::Boolean(true)));
        assert_eq!(m.values().get("text"), Some(&Value::Text("hi".into())));
        assert!(!m.values().contains_key("nothing"));
    }

    #[test]
    fn test_raw_value_rejects_composites() {
        let result = Measurement::builder().raw_value("v", &serde_json::json!([1, 2]));
        assert!(result.is_err());

        let result = Measurement::builder().raw_value("v", &serde_json::json!({"a": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = Measurement::builder()
            .name("m")
            .timestamp(7)
            .tag("b", "2")
            .tag("a", "1")
            .value("y", 2i32)
            .value("x", 1i32)
            .build()
            .unwrap();
        let b = Measurement::builder()
            .name("m")
            .timestamp(7)
            .tag("a", "1")
            .tag("b", "2")
            .value("x", 1i32)
            .value("y", 2i32)
            .build()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(123).to_string(), "123");
        assert_eq!(Value::Long(-5).to_string(), "-5");
        assert_eq!(Value::Double(0.5).to_string(), "0.5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Text("raw".into()).to_string(), "raw");
    }
}
