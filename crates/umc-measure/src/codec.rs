use bytes::Bytes;

use crate::error::MalformedBufferError;
use crate::measurement::Measurement;

/// Serializes an ordered measurement batch into a contiguous byte payload.
///
/// Payloads from repeated calls may be concatenated; a matching [`Decoder`]
/// must consume such a buffer without any outer length prefix.
pub trait Encoder {
    fn encode(&self, measurements: &[Measurement]) -> Bytes;
}

/// Turns a raw byte payload back into the measurement batch it encodes.
///
/// Implementations are stateless and safe to call concurrently on
/// independent buffers. An empty input decodes to an empty batch. A failed
/// decode returns the error alone; records parsed before the failure point
/// are not surfaced.
pub trait Decoder {
    fn decode(&self, buf: &[u8]) -> Result<Vec<Measurement>, MalformedBufferError>;
}
