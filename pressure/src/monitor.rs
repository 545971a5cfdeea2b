use std::fmt;

use crate::{error::PressureError, store::Store};

pub const MEMORY_SECTION: &str = "memory";
pub const USED_MEMORY_FIELD: &str = "used_memory";

const BYTES_PER_MEGABYTE: u64 = 1_000_000;

/// Memory limit in decimal megabytes; zero means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryCeiling {
    megabytes: u64,
}

impl MemoryCeiling {
    pub const UNLIMITED: MemoryCeiling = MemoryCeiling { megabytes: 0 };

    pub fn from_megabytes(megabytes: u64) -> Self {
        Self { megabytes }
    }

    pub fn megabytes(&self) -> u64 {
        self.megabytes
    }

    pub fn is_unlimited(&self) -> bool {
        self.megabytes == 0
    }

    /// Threshold in bytes, `None` when unlimited.
    pub fn bytes(&self) -> Option<u64> {
        if self.is_unlimited() {
            None
        } else {
            Some(self.megabytes.saturating_mul(BYTES_PER_MEGABYTE))
        }
    }

    pub fn reached(&self, used_bytes: u64) -> bool {
        self.bytes().is_some_and(|limit| used_bytes >= limit)
    }
}

impl fmt::Display for MemoryCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            f.write_str("unlimited")
        } else {
            write!(f, "{} Mo", self.megabytes)
        }
    }
}

/// Extracts `used_memory` from an `INFO memory` reply.
///
/// The reply is `key:value` lines; field order and surrounding fields do not
/// matter, and lookalikes such as `used_memory_rss` are skipped.
pub fn parse_used_memory(blob: &str) -> Result<u64, PressureError> {
    let value = blob
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find_map(|(key, value)| (key == USED_MEMORY_FIELD).then_some(value))
        .ok_or_else(|| {
            PressureError::Parse(format!("{} missing from INFO reply", USED_MEMORY_FIELD))
        })?;

    value.trim().parse::<u64>().map_err(|e| {
        PressureError::Parse(format!("{} value {:?}: {}", USED_MEMORY_FIELD, value, e))
    })
}

/// Asks the store for its current memory usage in bytes.
///
/// Never cached; each call is a fresh round trip and failures are not retried.
/// A failed INFO command or a non-text reply is a parse error like a missing
/// field: either way no reading could be taken.
pub async fn used_memory(store: &dyn Store) -> Result<u64, PressureError> {
    let blob = store
        .info(MEMORY_SECTION)
        .await
        .map_err(|e| PressureError::Parse(format!("INFO {}: {}", MEMORY_SECTION, e)))?;
    parse_used_memory(&blob)
}
