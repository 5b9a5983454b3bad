pub mod binary;
pub mod codec;
pub mod error;
pub mod json;
pub mod measurement;

pub use binary::BinaryCodec;
pub use codec::{Decoder, Encoder};
pub use error::{MalformedBufferError, UnsupportedTypeError, ValidationError};
pub use json::JsonCodec;
pub use measurement::{Builder, Measurement, Value};
