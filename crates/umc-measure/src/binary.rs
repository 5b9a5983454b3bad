use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use crate::codec::{Decoder, Encoder};
use crate::error::MalformedBufferError;
use crate::measurement::{Measurement, Value};

// Delimiter bytes of the legacy record layout. All string content on the
// wire is UTF-8, which can never contain bytes above 0xF4, so the
// delimiters cannot collide with encoded text.
const LEADIN: u8 = 0x00;
const ASSIGN: u8 = 0xfa;
const SEPARATOR: u8 = 0xfd;
const GROUP_SEPARATOR: u8 = 0xfe;

const TYPE_INTEGER: u8 = 0x01;
const TYPE_LONG: u8 = 0x02;
const TYPE_FLOAT: u8 = 0x03;
const TYPE_DOUBLE: u8 = 0x04;
const TYPE_BOOLEAN: u8 = 0x05;
const TYPE_STRING: u8 = 0x06;

/// The compact self-delimiting binary format used to move measurement
/// batches across the dispatch bus.
///
/// Each record is `LEADIN name GROUP_SEP timestamp(8B BE) GROUP_SEP
/// {tag-key ASSIGN tag-value SEPARATOR}* GROUP_SEP
/// {value-key ASSIGN type-tag payload SEPARATOR}*`; the next record's
/// LEADIN (or the end of the buffer) terminates the value section.
pub struct BinaryCodec;

impl Encoder for BinaryCodec {
    fn encode(&self, measurements: &[Measurement]) -> Bytes {
        let mut buf = Vec::with_capacity(64 * measurements.len());
        for m in measurements {
            buf.push(LEADIN);
            buf.extend_from_slice(m.name().as_bytes());
            buf.push(GROUP_SEPARATOR);

            let mut ts = [0u8; 8];
            BigEndian::write_i64(&mut ts, m.timestamp());
            buf.extend_from_slice(&ts);
            buf.push(GROUP_SEPARATOR);

            for (key, value) in m.tags() {
                buf.extend_from_slice(key.as_bytes());
                buf.push(ASSIGN);
                buf.extend_from_slice(value.as_bytes());
                buf.push(SEPARATOR);
            }
            buf.push(GROUP_SEPARATOR);

            for (key, value) in m.values() {
                buf.extend_from_slice(key.as_bytes());
                buf.push(ASSIGN);
                write_value(&mut buf, value);
                buf.push(SEPARATOR);
            }
        }
        Bytes::from(buf)
    }
}

impl Decoder for BinaryCodec {
    fn decode(&self, buf: &[u8]) -> Result<Vec<Measurement>, MalformedBufferError> {
        let mut measurements = Vec::new();
        let mut cursor = 0;
        while cursor < buf.len() {
            let (m, next) = decode_record(buf, cursor)?;
            measurements.push(m);
            cursor = next;
        }
        Ok(measurements)
    }
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(v) => {
            buf.push(TYPE_INTEGER);
            let mut tmp = [0u8; 4];
            BigEndian::write_i32(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        Value::Long(v) => {
            buf.push(TYPE_LONG);
            let mut tmp = [0u8; 8];
            BigEndian::write_i64(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        Value::Float(v) => {
            buf.push(TYPE_FLOAT);
            buf.extend_from_slice(&v.to_be_bytes());
        }
        Value::Double(v) => {
            buf.push(TYPE_DOUBLE);
            buf.extend_from_slice(&v.to_be_bytes());
        }
        Value::Boolean(v) => {
            buf.push(TYPE_BOOLEAN);
            buf.push(*v as u8);
        }
        Value::Text(v) => {
            buf.push(TYPE_STRING);
            buf.extend_from_slice(v.as_bytes());
        }
    }
}

/// Parses one record starting at or after `start`; returns the measurement
/// and the offset of the byte following it.
fn decode_record(
    buf: &[u8],
    start: usize,
) -> Result<(Measurement, usize), MalformedBufferError> {
    let mut builder = Measurement::builder();
    let mut cursor = find_next(buf, start, LEADIN)? + 1;

    let end = find_next(buf, cursor, GROUP_SEPARATOR)?;
    builder = builder.name(read_str(buf, cursor, end, "name")?);
    cursor = end + 1;

    let ts = read_bytes(buf, cursor, 8)?;
    builder = builder.timestamp(BigEndian::read_i64(ts));
    cursor = expect_delimiter(buf, cursor + 8, GROUP_SEPARATOR)?;

    let end = find_next(buf, cursor, GROUP_SEPARATOR)?;
    while cursor < end {
        let assign = find_next(buf, cursor, ASSIGN)?;
        let sep = find_next(buf, assign + 1, SEPARATOR)?;
        if assign >= end || sep >= end {
            return Err(MalformedBufferError::MissingDelimiter {
                delimiter: SEPARATOR,
            });
        }
        let key = read_str(buf, cursor, assign, "tag key")?;
        let value = read_str(buf, assign + 1, sep, "tag value")?;
        builder = builder.tag(key, value);
        cursor = sep + 1;
    }
    cursor = end + 1;

    // Values run to the end of the buffer or to the next record's lead-in.
    while cursor < buf.len() && buf[cursor] != LEADIN {
        let assign = find_next(buf, cursor, ASSIGN)?;
        let key = read_str(buf, cursor, assign, "value key")?.to_string();
        let (value, next) = read_value(buf, assign + 1)?;
        builder = builder.value(key, value);
        cursor = next;
    }

    Ok((builder.build()?, cursor))
}

fn read_value(buf: &[u8], from: usize) -> Result<(Value, usize), MalformedBufferError> {
    let tag = *buf
        .get(from)
        .ok_or(MalformedBufferError::InsufficientData { need: 1, have: 0 })?;

    match tag {
        TYPE_INTEGER => {
            let bytes = read_bytes(buf, from + 1, 4)?;
            let value = Value::Integer(BigEndian::read_i32(bytes));
            Ok((value, expect_delimiter(buf, from + 5, SEPARATOR)?))
        }
        TYPE_LONG => {
            let bytes = read_bytes(buf, from + 1, 8)?;
            let value = Value::Long(BigEndian::read_i64(bytes));
            Ok((value, expect_delimiter(buf, from + 9, SEPARATOR)?))
        }
        TYPE_FLOAT => {
            let bytes = read_bytes(buf, from + 1, 4)?;
            let value = Value::Float(f32::from_be_bytes(bytes.try_into().unwrap()));
            Ok((value, expect_delimiter(buf, from + 5, SEPARATOR)?))
        }
        TYPE_DOUBLE => {
            let bytes = read_bytes(buf, from + 1, 8)?;
            let value = Value::Double(f64::from_be_bytes(bytes.try_into().unwrap()));
            Ok((value, expect_delimiter(buf, from + 9, SEPARATOR)?))
        }
        TYPE_BOOLEAN => {
            let bytes = read_bytes(buf, from + 1, 1)?;
            let value = Value::Boolean(bytes[0] == 1);
            Ok((value, expect_delimiter(buf, from + 2, SEPARATOR)?))
        }
        TYPE_STRING => {
            let end = find_next(buf, from + 1, SEPARATOR)?;
            let value = Value::Text(read_str(buf, from + 1, end, "string value")?.to_string());
            Ok((value, end + 1))
        }
        other => Err(MalformedBufferError::UnknownTypeTag(other)),
    }
}

fn find_next(buf: &[u8], from: usize, delimiter: u8) -> Result<usize, MalformedBufferError> {
    buf[from.min(buf.len())..]
        .iter()
        .position(|&b| b == delimiter)
        .map(|pos| from + pos)
        .ok_or(MalformedBufferError::MissingDelimiter { delimiter })
}

/// Requires `delimiter` at `at`; returns the offset just past it.
fn expect_delimiter(
    buf: &[u8],
    at: usize,
    delimiter: u8,
) -> Result<usize, MalformedBufferError> {
    match buf.get(at) {
        Some(&b) if b == delimiter => Ok(at + 1),
        _ => Err(MalformedBufferError::MissingDelimiter { delimiter }),
    }
}

fn read_bytes<'a>(
    buf: &'a [u8],
    from: usize,
    n: usize,
) -> Result<&'a [u8], MalformedBufferError> {
    let have = buf.len().saturating_sub(from);
    if have < n {
        return Err(MalformedBufferError::InsufficientData { need: n, have });
    }
    Ok(&buf[from..from + n])
}

fn read_str<'a>(
    buf: &'a [u8],
    from: usize,
    to: usize,
    field: &'static str,
) -> Result<&'a str, MalformedBufferError> {
    std::str::from_utf8(&buf[from..to]).map_err(|_| MalformedBufferError::InvalidUtf8 { field })
}
