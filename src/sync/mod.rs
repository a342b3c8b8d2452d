//! Per-key invocation coalescing.
//!
//! This module provides:
//! - The scheduler and its per-key entry points ([`Scheduler`], [`BackgroundSync`])
//! - Coalescing options ([`SyncOptions`], [`DelayType`])
//! - The executed action and its observers ([`Action`], [`Callbacks`])
//! - Raw per-key storage ([`KeyStore`], [`TimerHandle`])
//!
//! # Disciplines
//!
//! | Delay type | New input while pending | Fires |
//! |------------|-------------------------|-------|
//! | Debounce | Timer restarted | `delay_time` after the last input |
//! | Throttle | Folded into the value | `delay_time` after the first input of the window |
//!
//! In both modes a satisfied trigger condition cancels the pending timer and
//! fires at once. At most one timer exists per key at any time.
//!
//! # Execution
//!
//! Executions are fire-and-forget: the value is captured (and optionally
//! reset) synchronously, then the action runs on its own task. A new
//! execution for the same key can start before the previous one finished,
//! so observers may run out of order.

mod action;
mod options;
mod scheduler;
mod store;


pub use action::{Action, Callbacks};
pub use options::{Concatenate, DelayType, ParseDelayTypeError, SyncOptions, TriggerCondition};
pub use scheduler::{BackgroundSync, Scheduler};
pub use store::{KeyState, KeyStore, TimerHandle};
