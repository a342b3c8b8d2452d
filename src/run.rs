//! Application execution logic.
//!
//! Reads `<key> <value>` lines from stdin, batches values per key with
//! the key's sync policy and hands every flushed batch to the sender.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};

use bgsync::config::{SyncPolicies, SyncPolicy, ValidatedConfig};
use bgsync::sync::{Action, BackgroundSync, Callbacks, Scheduler, SyncOptions};
use bgsync::time::{Clock, SystemClock};
use bgsync::webhook::{
    Batch, BatchSender, DryRunSender, Endpoint, HttpError, HttpWebhook, ReqwestClient, WebhookError,
};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Reading the input stream failed.
    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),

    /// The webhook transport could not be set up.
    #[error("Cannot start webhook delivery: {0}")]
    Client(#[source] HttpError),
}

/// Executes the main application loop.
///
/// Runs until stdin is closed and every pending batch has been sent,
/// or until a shutdown signal (Ctrl+C, SIGTERM) arrives.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or stdin cannot be read.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match config.url.clone() {
        Some(url) if !config.dry_run => {
            let webhook = create_webhook(&config, url)?;
            let (router, drained) = KeyRouter::new(Arc::new(webhook), clock, config.policies);
            run_loop(lines, router, drained, shutdown_signal()).await
        }
        _ => {
            tracing::info!("Dry-run mode enabled - batches will be logged but not sent");
            let (router, drained) = KeyRouter::new(Arc::new(DryRunSender), clock, config.policies);
            run_loop(lines, router, drained, shutdown_signal()).await
        }
    }
}

/// Creates the HTTP webhook sender for `url` from configuration.
fn create_webhook(
    config: &ValidatedConfig,
    url: url::Url,
) -> Result<HttpWebhook<ReqwestClient>, RunError> {
    let endpoint = Endpoint {
        url,
        method: config.method.clone(),
        headers: config.headers.clone(),
    };
    let webhook = HttpWebhook::new(ReqwestClient::new().map_err(RunError::Client)?, endpoint);

    Ok(match config.body_template.clone() {
        Some(template) => webhook.with_template(template),
        None => webhook,
    })
}

/// Consumes input lines until EOF, then waits for pending batches.
///
/// `drained` resolves once every registered action has been dropped,
/// which happens after the last timer fired and the last send finished.
async fn run_loop<S, W>(
    mut lines: S,
    mut router: KeyRouter<W>,
    mut drained: mpsc::Receiver<()>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RunError>
where
    S: Stream<Item = std::io::Result<String>> + Unpin,
    W: BatchSender + 'static,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                return Ok(());
            }

            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if let Some((key, value)) = parse_event(&line) {
                        router.route(key, value);
                    }
                }
                Some(Err(e)) => return Err(RunError::Input(e)),
                None => break,
            }
        }
    }

    tracing::info!(
        keys = router.key_count(),
        pending = router.pending_count(),
        "Input closed, flushing pending batches"
    );
    drop(router);

    tokio::select! {
        biased;

        () = &mut shutdown => {
            tracing::warn!("Shutdown signal received, pending batches dropped");
        }

        _ = drained.recv() => {
            tracing::info!("All batches flushed");
        }
    }

    Ok(())
}

/// Splits an input line into key and value.
///
/// Blank lines and `#` comments are skipped silently; lines without a
/// value are logged and skipped. The value keeps its inner whitespace.
fn parse_event(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    match line.split_once(char::is_whitespace) {
        Some((key, value)) if !value.trim().is_empty() => Some((key, value.trim())),
        _ => {
            tracing::warn!("Ignoring malformed line (expected '<key> <value>'): {line}");
            None
        }
    }
}

/// Builds the scheduler options for one key's policy.
///
/// Values append to the pending batch; `max_batch` flushes early.
fn batch_options(policy: &SyncPolicy) -> SyncOptions<Vec<String>> {
    let options = SyncOptions::new(policy.delay_type, policy.delay)
        .with_clear_on_execute(policy.clear_on_execute)
        .with_concatenate(|mut batch: Vec<String>, incoming: Vec<String>| {
            batch.extend(incoming);
            batch
        });

    match policy.max_batch {
        Some(max) => options.with_trigger_condition(move |batch: &Vec<String>| batch.len() >= max),
        None => options,
    }
}

/// Registers keys on first sight and forwards values to them.
struct KeyRouter<W> {
    scheduler: Scheduler<Vec<String>>,
    keys: HashMap<String, BackgroundSync<Vec<String>>>,
    sender: Arc<W>,
    clock: Arc<dyn Clock>,
    policies: SyncPolicies,
    alive: mpsc::Sender<()>,
}

impl<W: BatchSender + 'static> KeyRouter<W> {
    /// Creates a router and the receiver that closes once it is drained.
    fn new(
        sender: Arc<W>,
        clock: Arc<dyn Clock>,
        policies: SyncPolicies,
    ) -> (Self, mpsc::Receiver<()>) {
        let (alive, drained) = mpsc::channel(1);
        let router = Self {
            scheduler: Scheduler::new(),
            keys: HashMap::new(),
            sender,
            clock,
            policies,
            alive,
        };
        (router, drained)
    }

    fn route(&mut self, key: &str, value: &str) {
        let incoming = vec![value.to_string()];

        if let Some(sync) = self.keys.get(key) {
            sync.push(incoming);
            return;
        }

        let sync = self.register(key);
        sync.push(incoming);
        self.keys.insert(key.to_string(), sync);
    }

    fn register(&self, key: &str) -> BackgroundSync<Vec<String>> {
        let policy = self.policies.for_key(key);
        tracing::info!(key = %key, "Tracking new key ({policy})");

        let action = SendBatch {
            key: key.to_string(),
            sender: Arc::clone(&self.sender),
            clock: Arc::clone(&self.clock),
            _alive: self.alive.clone(),
        };

        let sent_key = key.to_string();
        let failed_key = key.to_string();
        let callbacks = Callbacks::<Vec<String>, _>::new(action)
            .on_success(move |count| {
                tracing::info!(key = %sent_key, count, "Batch sent");
            })
            .on_error(move |e: WebhookError| {
                tracing::error!(key = %failed_key, "Webhook failed: {e}");
            });

        self.scheduler
            .register(key, Vec::new(), callbacks, batch_options(policy))
    }

    fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }
}

/// Sync action delivering one key's batch.
struct SendBatch<W> {
    key: String,
    sender: Arc<W>,
    clock: Arc<dyn Clock>,
    // Keeps the drain channel open while any timer or send can still use this action.
    _alive: mpsc::Sender<()>,
}

impl<W: BatchSender + 'static> Action<Vec<String>> for SendBatch<W> {
    type Output = usize;
    type Error = WebhookError;

    async fn execute(&self, values: Vec<String>) -> Result<usize, WebhookError> {
        if values.is_empty() {
            return Ok(0);
        }

        let batch = Batch::new(self.key.clone(), values, self.clock.now());
        self.sender.send(&batch).await?;
        Ok(batch.len())
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
