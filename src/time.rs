//! Wall-clock abstraction for batch timestamps.
//!
//! Timer scheduling runs on tokio's clock; this trait only stamps
//! outgoing batches, so tests can pin the value.

use std::time::SystemTime;

/// Where batch timestamps come from.
///
/// ```
/// use bgsync::time::{Clock, FixedClock};
/// use bgsync::webhook::Batch;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let clock = FixedClock(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
/// let batch = Batch::new("orders", vec!["1".into()], clock.now());
/// assert_eq!(batch.timestamp, 1_700_000_000);
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Pins every batch to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}
