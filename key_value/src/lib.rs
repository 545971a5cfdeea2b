pub mod key_generator;
pub mod payload;

pub use key_generator::KeyGenerator;
pub use payload::Payload;

/// One SET issued by a write-mode worker.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    pub key: String,
    pub value: Payload,
}
