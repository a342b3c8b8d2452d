//! Per-key storage of accumulated values and pending timers.

use std::collections::HashMap;

use tokio::task::AbortHandle;

/// Owned handle to one scheduled execution.
///
/// Dropping the handle cancels the timer task, so a timer can never outlive
/// the slot that tracks it. The `id` tells a timer that already woke up
/// apart from the one that replaced it.
#[derive(Debug)]
pub struct TimerHandle {
    id: u64,
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    /// Wraps the abort handle of a spawned timer task.
    #[must_use]
    pub const fn new(id: u64, abort: AbortHandle) -> Self {
        Self {
            id,
            abort: Some(abort),
        }
    }

    /// Returns the store-assigned timer id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Consumes the handle without aborting the task.
    ///
    /// Used by a timer that is firing to drop its own handle.
    pub fn release(mut self) {
        self.abort = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

/// State held for a single key.
#[derive(Debug)]
pub struct KeyState<T> {
    /// Value accumulated since the last reset.
    pub value: T,
    timer: Option<TimerHandle>,
}

impl<T> KeyState<T> {
    const fn new(value: T) -> Self {
        Self { value, timer: None }
    }
}

/// Mapping from key name to its accumulated value and pending timer.
///
/// Pure storage: no policy decisions are made here.
#[derive(Debug)]
pub struct KeyStore<T> {
    entries: HashMap<String, KeyState<T>>,
    next_timer_id: u64,
}

impl<T> Default for KeyStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KeyStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_timer_id: 0,
        }
    }

    /// Returns the current value for `name`, or `default` if the key was never set.
    #[must_use]
    pub fn get(&self, name: &str, default: &T) -> T
    where
        T: Clone,
    {
        self.entries
            .get(name)
            .map_or_else(|| default.clone(), |state| state.value.clone())
    }

    /// Returns a reference to the stored value, if any.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(|state| &state.value)
    }

    /// Overwrites the value for `name`, keeping any pending timer.
    pub fn set(&mut self, name: &str, value: T) {
        match self.entries.get_mut(name) {
            Some(state) => state.value = value,
            None => {
                self.entries.insert(name.to_owned(), KeyState::new(value));
            }
        }
    }

    /// Returns true if `name` has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Allocates the id for the next timer.
    pub const fn next_timer_id(&mut self) -> u64 {
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        self.next_timer_id
    }

    /// Records `handle` as the pending timer for `name`.
    ///
    /// Any handle already recorded is dropped, which cancels it. Handles for
    /// keys without an entry are dropped as well.
    pub fn set_timer(&mut self, name: &str, handle: TimerHandle) {
        if let Some(state) = self.entries.get_mut(name) {
            state.timer = Some(handle);
        }
    }

    /// Cancels and removes the pending timer for `name`.
    ///
    /// Returns true if a timer was pending.
    pub fn clear_timer(&mut self, name: &str) -> bool {
        self.entries
            .get_mut(name)
            .and_then(|state| state.timer.take())
            .is_some()
    }

    /// Removes the pending timer for `name` only if it carries `id`.
    ///
    /// The handle is returned uncancelled so the caller decides its fate.
    pub fn take_timer(&mut self, name: &str, id: u64) -> Option<TimerHandle> {
        let state = self.entries.get_mut(name)?;
        if state.timer.as_ref().is_some_and(|timer| timer.id() == id) {
            state.timer.take()
        } else {
            None
        }
    }

    /// Returns true if `name` has a pending timer.
    #[must_use]
    pub fn has_timer(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|state| state.timer.is_some())
    }

    /// Number of keys with a pending timer.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|state| state.timer.is_some())
            .count()
    }
}
