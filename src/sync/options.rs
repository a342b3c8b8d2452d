//! Coalescing options bound to a registration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Folds an incoming value into the accumulated one.
pub type Concatenate<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// Predicate that forces immediate execution when it holds.
pub type TriggerCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Coalescing discipline for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayType {
    /// Fire once the key has been quiet for the whole delay.
    #[default]
    Debounce,
    /// Fire at most once per delay window.
    Throttle,
}

impl DelayType {
    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::Throttle => "throttle",
        }
    }
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`DelayType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown delay type '{0}': expected debounce or throttle")]
pub struct ParseDelayTypeError(pub String);

impl FromStr for DelayType {
    type Err = ParseDelayTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debounce" => Ok(Self::Debounce),
            "throttle" => Ok(Self::Throttle),
            _ => Err(ParseDelayTypeError(s.to_string())),
        }
    }
}

/// Options controlling when a key's action fires.
///
/// # Example
///
/// ```
/// use bgsync::sync::{DelayType, SyncOptions};
/// use std::time::Duration;
///
/// let options = SyncOptions::<u32>::throttle(Duration::from_millis(100))
///     .with_concatenate(|current, incoming| current + incoming)
///     .with_trigger_condition(|total| *total >= 10)
///     .with_clear_on_execute(true);
///
/// assert_eq!(options.delay_type, DelayType::Throttle);
/// assert!(options.is_triggered(&12));
/// ```
pub struct SyncOptions<T> {
    /// Debounce or throttle.
    pub delay_type: DelayType,

    /// Quiet period (debounce) or window length (throttle).
    pub delay_time: Duration,

    /// Reset the value to the default as soon as an execution is started.
    pub clear_on_execute: bool,

    concatenate: Option<Concatenate<T>>,
    trigger_condition: Option<TriggerCondition<T>>,
}

impl<T> SyncOptions<T> {
    /// Creates options with replacement semantics and no trigger condition.
    #[must_use]
    pub const fn new(delay_type: DelayType, delay_time: Duration) -> Self {
        Self {
            delay_type,
            delay_time,
            clear_on_execute: false,
            concatenate: None,
            trigger_condition: None,
        }
    }

    /// Shorthand for [`DelayType::Debounce`].
    #[must_use]
    pub const fn debounce(delay_time: Duration) -> Self {
        Self::new(DelayType::Debounce, delay_time)
    }

    /// Shorthand for [`DelayType::Throttle`].
    #[must_use]
    pub const fn throttle(delay_time: Duration) -> Self {
        Self::new(DelayType::Throttle, delay_time)
    }

    /// Folds each input into the accumulated value with `concatenate`.
    ///
    /// Without it, each input replaces the accumulated value.
    #[must_use]
    pub fn with_concatenate(
        mut self,
        concatenate: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.concatenate = Some(Arc::new(concatenate));
        self
    }

    /// Fires immediately whenever `condition` holds for the accumulated value.
    #[must_use]
    pub fn with_trigger_condition(
        mut self,
        condition: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.trigger_condition = Some(Arc::new(condition));
        self
    }

    /// Sets whether the value resets to the default when execution starts.
    #[must_use]
    pub const fn with_clear_on_execute(mut self, clear: bool) -> Self {
        self.clear_on_execute = clear;
        self
    }

    /// Returns true if a concatenation function is configured.
    #[must_use]
    pub const fn has_concatenate(&self) -> bool {
        self.concatenate.is_some()
    }

    /// Combines the accumulated value with an incoming one.
    ///
    /// `current` is only evaluated when a concatenation function is configured.
    pub fn accumulate(&self, current: impl FnOnce() -> T, incoming: T) -> T {
        match &self.concatenate {
            Some(concatenate) => concatenate(current(), incoming),
            None => incoming,
        }
    }

    /// Evaluates the trigger condition; false when none is configured.
    #[must_use]
    pub fn is_triggered(&self, value: &T) -> bool {
        self.trigger_condition
            .as_ref()
            .is_some_and(|condition| condition(value))
    }
}

impl<T> Clone for SyncOptions<T> {
    fn clone(&self) -> Self {
        Self {
            delay_type: self.delay_type,
            delay_time: self.delay_time,
            clear_on_execute: self.clear_on_execute,
            concatenate: self.concatenate.clone(),
            trigger_condition: self.trigger_condition.clone(),
        }
    }
}

impl<T> fmt::Debug for SyncOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("delay_type", &self.delay_type)
            .field("delay_time", &self.delay_time)
            .field("clear_on_execute", &self.clear_on_execute)
            .field("concatenate", &self.concatenate.is_some())
            .field("trigger_condition", &self.trigger_condition.is_some())
            .finish()
    }
}
