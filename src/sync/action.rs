//! The action a registration runs and its result observers.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Asynchronous work executed with a key's accumulated value.
///
/// Implemented for every `Fn(T) -> impl Future<Output = Result<R, E>>`
/// closure, so most callers never implement it by hand.
///
/// # Example
///
/// ```
/// use bgsync::sync::Action;
///
/// struct Save;
///
/// impl Action<Vec<String>> for Save {
///     type Output = usize;
///     type Error = std::io::Error;
///
///     async fn execute(&self, lines: Vec<String>) -> Result<usize, std::io::Error> {
///         Ok(lines.len())
///     }
/// }
/// ```
pub trait Action<T>: Send + Sync + 'static {
    /// Value handed to the success observer.
    type Output: Send + 'static;

    /// Failure handed to the error observer.
    type Error: fmt::Display + Send + 'static;

    /// Runs the action with the accumulated value.
    fn execute(
        &self,
        value: T,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

impl<T, F, Fut, R, E> Action<T> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send,
    R: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Output = R;
    type Error = E;

    fn execute(&self, value: T) -> impl Future<Output = Result<R, E>> + Send {
        self(value)
    }
}

type Observer<V> = Box<dyn Fn(V) + Send + Sync>;

/// An action plus optional observers for its outcome.
///
/// Observers are informational: a failure is never retried.
pub struct Callbacks<T, A: Action<T>> {
    action: A,
    on_success: Option<Observer<A::Output>>,
    on_error: Option<Observer<A::Error>>,
    _value: PhantomData<fn(T)>,
}

impl<T, A: Action<T>> Callbacks<T, A> {
    /// Wraps `action` with no observers.
    #[must_use]
    pub const fn new(action: A) -> Self {
        Self {
            action,
            on_success: None,
            on_error: None,
            _value: PhantomData,
        }
    }

    /// Observes successful results.
    #[must_use]
    pub fn on_success(mut self, observer: impl Fn(A::Output) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(observer));
        self
    }

    /// Observes failures.
    #[must_use]
    pub fn on_error(mut self, observer: impl Fn(A::Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(observer));
        self
    }
}

impl<T, A: Action<T>> fmt::Debug for Callbacks<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Type-erased execution entry used by the scheduler.
pub(super) trait Execute<T>: Send + Sync {
    /// Starts the action on a new task and returns immediately.
    fn spawn(self: Arc<Self>, key: &str, value: T);
}

impl<T, A> Execute<T> for Callbacks<T, A>
where
    T: Send + 'static,
    A: Action<T>,
{
    fn spawn(self: Arc<Self>, key: &str, value: T) {
        let key = key.to_owned();
        tokio::spawn(async move {
            match self.action.execute(value).await {
                Ok(output) => {
                    tracing::debug!(key = %key, "Execution succeeded");
                    if let Some(on_success) = &self.on_success {
                        on_success(output);
                    }
                }
                Err(error) => match &self.on_error {
                    Some(on_error) => on_error(error),
                    None => {
                        tracing::debug!(key = %key, "Execution failed (unobserved): {error}");
                    }
                },
            }
        });
    }
}
