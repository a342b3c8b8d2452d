//! Debounce and throttle scheduling over a shared key store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::action::{Action, Callbacks, Execute};
use super::options::{DelayType, SyncOptions};
use super::store::{KeyStore, TimerHandle};

type SharedStore<T> = Arc<Mutex<KeyStore<T>>>;

fn lock<T>(store: &Mutex<KeyStore<T>>) -> MutexGuard<'_, KeyStore<T>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the per-key state for a set of registrations.
///
/// Registrations made through the same scheduler share one slot per key
/// name: two registrations under the same name see each other's value and
/// timer. Separate schedulers never interact.
///
/// Cloning is cheap; clones share the same store.
///
/// # Example
///
/// ```
/// use bgsync::sync::{Callbacks, Scheduler, SyncOptions};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scheduler = Scheduler::new();
/// let save = scheduler.register(
///     "drafts",
///     Vec::new(),
///     Callbacks::new(|lines: Vec<String>| async move {
///         Ok::<_, std::io::Error>(lines.len())
///     }),
///     SyncOptions::debounce(Duration::from_millis(50))
///         .with_concatenate(|mut all: Vec<String>, new| {
///             all.extend(new);
///             all
///         })
///         .with_clear_on_execute(true),
/// );
///
/// save.push(vec!["first".to_string()]);
/// save.push(vec!["second".to_string()]);
/// assert!(save.is_pending());
/// # }
/// ```
#[derive(Debug)]
pub struct Scheduler<T> {
    store: SharedStore<T>,
}

impl<T> Clone for Scheduler<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates a scheduler with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(KeyStore::new())),
        }
    }

    /// Returns true if `name` has a scheduled execution.
    #[must_use]
    pub fn has_pending(&self, name: &str) -> bool {
        lock(&self.store).has_timer(name)
    }

    /// Number of keys with a scheduled execution.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.store).pending_count()
    }

    /// Cancels the scheduled execution for `name` without running it.
    ///
    /// The accumulated value is kept. Returns true if a timer was pending.
    pub fn cancel(&self, name: &str) -> bool {
        let cancelled = lock(&self.store).clear_timer(name);
        if cancelled {
            tracing::debug!(key = %name, "Pending execution cancelled");
        }
        cancelled
    }
}

impl<T: Clone + Send + Sync + 'static> Scheduler<T> {
    /// Registers `name` and returns its input entry point.
    ///
    /// The key's value is reset to `default`; a timer already pending under
    /// the same name is left running.
    pub fn register<A: Action<T>>(
        &self,
        name: impl Into<String>,
        default: T,
        callbacks: Callbacks<T, A>,
        options: SyncOptions<T>,
    ) -> BackgroundSync<T> {
        let name = name.into();
        lock(&self.store).set(&name, default.clone());

        tracing::debug!(
            key = %name,
            delay_type = %options.delay_type,
            delay = ?options.delay_time,
            "Registered key"
        );

        BackgroundSync {
            inner: Arc::new(Registration {
                name,
                default,
                options,
                store: Arc::clone(&self.store),
                executor: Arc::new(callbacks),
            }),
        }
    }

    /// Returns a copy of the value accumulated for `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<T> {
        lock(&self.store).value(name).cloned()
    }
}

/// Input entry point for one registered key.
///
/// [`push`](Self::push) never blocks and never fails: the action runs on a
/// spawned task and its outcome is visible only through the configured
/// observers.
pub struct BackgroundSync<T> {
    inner: Arc<Registration<T>>,
}

impl<T> Clone for BackgroundSync<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for BackgroundSync<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundSync")
            .field("name", &self.inner.name)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> BackgroundSync<T> {
    /// Feeds a new value into the key.
    ///
    /// Dispatches to the debounce or throttle algorithm per the configured
    /// [`DelayType`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn push(&self, value: T) {
        match self.inner.options.delay_type {
            DelayType::Debounce => self.inner.debounce(value),
            DelayType::Throttle => self.inner.throttle(value),
        }
    }

    /// Turns the entry point into a plain closure.
    pub fn into_fn(self) -> impl Fn(T) + Clone + Send + Sync + 'static {
        move |value| self.push(value)
    }

    /// Returns the registered key name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the configured delay type.
    #[must_use]
    pub fn delay_type(&self) -> DelayType {
        self.inner.options.delay_type
    }

    /// Returns a copy of the currently accumulated value.
    #[must_use]
    pub fn value(&self) -> T {
        lock(&self.inner.store).get(&self.inner.name, &self.inner.default)
    }

    /// Returns true if an execution is scheduled for this key.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        lock(&self.inner.store).has_timer(&self.inner.name)
    }
}

struct Registration<T> {
    name: String,
    default: T,
    options: SyncOptions<T>,
    store: SharedStore<T>,
    executor: Arc<dyn Execute<T>>,
}

impl<T: Clone + Send + Sync + 'static> Registration<T> {
    fn debounce(self: &Arc<Self>, value: T) {
        let mut store = lock(&self.store);

        if store.clear_timer(&self.name) {
            tracing::debug!(key = %self.name, "Debounce window restarted");
        }

        if self.accumulate(&mut store, value) {
            self.execute(&mut store);
            return;
        }

        self.schedule(&mut store);
    }

    fn throttle(self: &Arc<Self>, value: T) {
        let mut store = lock(&self.store);

        if self.accumulate(&mut store, value) {
            store.clear_timer(&self.name);
            self.execute(&mut store);
            return;
        }

        // Folded into the value the open window will carry
        if store.has_timer(&self.name) {
            return;
        }

        self.schedule(&mut store);
    }

    /// Stores the new accumulated value and reports whether it triggers.
    fn accumulate(&self, store: &mut KeyStore<T>, value: T) -> bool {
        let next = self
            .options
            .accumulate(|| store.get(&self.name, &self.default), value);
        let triggered = self.options.is_triggered(&next);
        store.set(&self.name, next);
        triggered
    }

    fn schedule(self: &Arc<Self>, store: &mut KeyStore<T>) {
        let id = store.next_timer_id();
        let delay = self.options.delay_time;
        let registration = Arc::clone(self);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registration.fire(id);
        });

        store.set_timer(&self.name, TimerHandle::new(id, task.abort_handle()));
        tracing::debug!(key = %self.name, delay = ?delay, "Execution scheduled");
    }

    fn fire(&self, id: u64) {
        let mut store = lock(&self.store);

        let Some(timer) = store.take_timer(&self.name, id) else {
            tracing::debug!(key = %self.name, "Stale timer ignored");
            return;
        };
        timer.release();

        self.execute(&mut store);
    }

    fn execute(&self, store: &mut KeyStore<T>) {
        let value = store.get(&self.name, &self.default);

        if self.options.clear_on_execute {
            store.set(&self.name, self.default.clone());
        }

        tracing::debug!(key = %self.name, "Executing");
        Arc::clone(&self.executor).spawn(&self.name, value);
    }
}
