pub mod bus;

pub use bus::{MessageBus, Subscriber};

/// Well-known address on which encoded measurement batches are published
/// for persistence. Process-wide constant; producers publish here, every
/// digester subscribes here.
pub const PERSIST_ADDR: &str = "measurements.persist";
