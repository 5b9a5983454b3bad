use bytes::Bytes;

use umc_measure::{Encoder, Measurement};

/// The line text format the time-series backend ingests:
///
/// ```text
/// name,tag1=v1,tag2=v2 key1=v1,key2=v2i timestamp\n
/// ```
///
/// Integer and long values carry the backend's `i` suffix; all other kinds
/// render in their plain textual form. Tags and values appear in canonical
/// key order. Write-path only; the backend never sends lines back.
pub struct LineCodec;

impl Encoder for LineCodec {
    fn encode(&self, measurements: &[Measurement]) -> Bytes {
        let mut out = String::with_capacity(128 * measurements.len());
        for m in measurements {
            append_measurement(&mut out, m);
        }
        Bytes::from(out.into_bytes())
    }
}

fn append_measurement(out: &mut String, m: &Measurement) {
    out.push_str(m.name());
    for (key, value) in m.tags() {
        out.push(',');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out.push(' ');

    let mut first = true;
    for (key, value) in m.values() {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(key);
        out.push('=');
        out.push_str(&value.to_string());
        if value.is_integral() {
            out.push('i');
        }
    }

    out.push(' ');
    out.push_str(&m.timestamp().to_string());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(m: &Measurement) -> String {
        String::from_utf8(LineCodec.encode(std::slice::from_ref(m)).to_vec()).unwrap()
    }

    #[test]
    fn test_integer_values_carry_suffix() {
        let m = Measurement::builder()
            .name("mem")
            .timestamp(2000)
            .tag("host", "b")
            .value("used", 1024i32)
            .build()
            .unwrap();

        assert_eq!(render(&m), "mem,host=b used=1024i 2000\n");
    }

    #[test]
    fn test_long_values_carry_suffix() {
        let m = Measurement::builder()
            .name("disk")
            .timestamp(5)
            .value("bytes", 5_000_000_000i64)
            .build()
            .unwrap();

        assert_eq!(render(&m), "disk bytes=5000000000i 5\n");
    }

    #[test]
    fn test_non_integer_values_have_no_suffix() {
        let m = Measurement::builder()
            .name("probe")
            .timestamp(9)
            .value("load", 0.5f64)
            .value("ok", true)
            .value("state", "up")
            .build()
            .unwrap();

        assert_eq!(render(&m), "probe load=0.5,ok=true,state=up 9\n");
    }

    #[test]
    fn test_tags_render_in_key_order() {
        let m = Measurement::builder()
            .name("m")
            .timestamp(1)
            .tag("zone", "eu")
            .tag("host", "a")
            .value("v", 1i32)
            .build()
            .unwrap();

        assert_eq!(render(&m), "m,host=a,zone=eu v=1i 1\n");
    }

    #[test]
    fn test_batch_renders_one_line_per_measurement() {
        let cpu = Measurement::builder()
            .name("cpu")
            .timestamp(1000)
            .tag("host", "a")
            .value("load", 0.5f64)
            .build()
            .unwrap();
        let mem = Measurement::builder()
            .name("mem")
            .timestamp(2000)
            .tag("host", "b")
            .value("used", 1024i32)
            .build()
            .unwrap();

        let text = String::from_utf8(LineCodec.encode(&[cpu, mem]).to_vec()).unwrap();
        assert_eq!(text, "cpu,host=a load=0.5 1000\nmem,host=b used=1024i 2000\n");
    }

    #[test]
    fn test_empty_batch_renders_nothing() {
        assert!(LineCodec.encode(&[]).is_empty());
    }
}
