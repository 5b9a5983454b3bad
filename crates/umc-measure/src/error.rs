use thiserror::Error;

/// Errors raised when `Builder::build` rejects the collected parameters.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("name is not set")]
    NameNotSet,

    #[error("timestamp is invalid: {0}")]
    NegativeTimestamp(i64),

    #[error("no values recorded")]
    NoValues,
}

/// A raw value presented to the decode path was none of the six supported
/// kinds (i32, i64, f32, f64, bool, string).
#[derive(Debug, Error)]
#[error("unsupported value type: {kind}")]
pub struct UnsupportedTypeError {
    pub kind: String,
}

impl UnsupportedTypeError {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// Errors raised while decoding an encoded measurement batch.
#[derive(Debug, Error)]
pub enum MalformedBufferError {
    /// A required delimiter byte was not found before the buffer ended.
    #[error("delimiter {delimiter:#04x} not found before end of buffer")]
    MissingDelimiter { delimiter: u8 },

    /// A value carried a type tag outside the known range.
    #[error("unknown value type tag: {0:#04x}")]
    UnknownTypeTag(u8),

    #[error("insufficient data: need {need} bytes but only {have} remain")]
    InsufficientData { need: usize, have: usize },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    /// The input was not parseable as the expected JSON shape.
    #[error("invalid JSON batch: {0}")]
    InvalidJson(String),

    #[error("decoded value is unusable: {0}")]
    UnsupportedType(#[from] UnsupportedTypeError),

    /// The decoded record did not form a valid measurement.
    #[error("decoded measurement failed validation: {0}")]
    Validation(#[from] ValidationError),
}
