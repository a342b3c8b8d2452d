//! bgsync: per-key background synchronization.
//!
//! The [`sync`] module coalesces values pushed under string keys and runs
//! an async action per key with debounce or throttle timing. The binary
//! built on top reads `<key> <value>` lines from stdin and delivers each
//! flushed batch to a webhook.

pub mod config;
pub mod sync;
pub mod time;
pub mod webhook;
