//! The payload delivered for one flushed key.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Values accumulated for one key between two sends.
///
/// Serializes as `{"key", "values", "count", "timestamp"}`, which is both
/// the default JSON body and the data handed to a body template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Key the values were pushed under
    pub key: String,

    /// Values in arrival order
    pub values: Vec<String>,

    /// Number of values
    pub count: usize,

    /// Unix timestamp (seconds) of the flush
    pub timestamp: u64,
}

impl Batch {
    /// Creates a batch flushed at `at`.
    ///
    /// Pre-epoch times are recorded as 0.
    #[must_use]
    pub fn new(key: impl Into<String>, values: Vec<String>, at: SystemTime) -> Self {
        let timestamp = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        Self {
            key: key.into(),
            count: values.len(),
            values,
            timestamp,
        }
    }

    /// Number of values in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the batch carries no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}
