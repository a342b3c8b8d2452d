//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::sync::DelayType;

/// Default HTTP method for webhook requests.
pub const METHOD: &str = "POST";

/// Default coalescing discipline.
pub const DELAY_TYPE: DelayType = DelayType::Debounce;

/// Default delay in milliseconds.
pub const DELAY_MS: u64 = 1000;

/// Whether a key starts a fresh batch after each send.
pub const CLEAR_ON_EXECUTE: bool = true;

/// Default delay as Duration.
#[must_use]
pub const fn delay() -> Duration {
    Duration::from_millis(DELAY_MS)
}
