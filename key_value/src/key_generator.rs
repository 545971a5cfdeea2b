use rand::Rng;
use uuid::{Builder, Uuid};

use crate::{KeyValue, Payload};

/// Produces `prefix + uuid-v4` keys from an owned random source.
///
/// Each worker owns its own generator, so no synchronization is needed and a
/// seeded `rng` yields a reproducible key stream.
#[derive(Debug, Clone)]
pub struct KeyGenerator<R> {
    prefix: String,
    rng: R,
}

impl<R: Rng> KeyGenerator<R> {
    pub fn new(prefix: impl Into<String>, rng: R) -> Self {
        Self {
            prefix: prefix.into(),
            rng,
        }
    }

    pub fn next_uuid(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.random()).into_uuid()
    }

    pub fn next_key(&mut self) -> String {
        let id = self.next_uuid();
        format!("{}{}", self.prefix, id)
    }

    pub fn next_pair(&mut self, value: &Payload) -> KeyValue {
        KeyValue {
            key: self.next_key(),
            value: value.clone(),
        }
    }
}
