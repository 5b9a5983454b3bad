pub mod digester;
pub mod error;
pub mod influx;
pub mod line;

pub use digester::InfluxDigester;
pub use error::TransportError;
pub use influx::{InfluxClient, InfluxConfig};
pub use line::LineCodec;
