//! Batch sender trait and its HTTP and dry-run implementations.

use handlebars::{Handlebars, Template};

use super::{Batch, Delivery, Endpoint, Transport, WebhookError};

/// Registry name of the compiled body template.
const BODY: &str = "body";

/// Delivers flushed batches to an external service.
///
/// Called once per execution of a key's sync action. Failures are
/// reported to the caller and never retried here.
pub trait BatchSender: Send + Sync {
    /// Sends one batch.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the batch could not be delivered.
    fn send(
        &self,
        batch: &Batch,
    ) -> impl std::future::Future<Output = Result<(), WebhookError>> + Send;
}

/// Sends batches to an [`Endpoint`] over a [`Transport`].
///
/// Without a template the body is the batch as JSON. With a Handlebars
/// template the variables are `key`, `values`, `count` and `timestamp`.
///
/// # Example
///
/// ```no_run
/// use bgsync::webhook::{Endpoint, HttpWebhook, ReqwestClient};
/// use handlebars::Template;
/// use url::Url;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Endpoint::new(Url::parse("https://api.example.com/sync")?);
/// let webhook = HttpWebhook::new(ReqwestClient::new()?, endpoint)
///     .with_template(Template::compile("{{count}} values for {{key}}")?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpWebhook<T> {
    transport: T,
    endpoint: Endpoint,
    templates: Option<Handlebars<'static>>,
}

impl<T> HttpWebhook<T> {
    #[must_use]
    pub const fn new(transport: T, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            templates: None,
        }
    }

    /// Renders bodies with a compiled Handlebars template instead of JSON.
    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        let mut templates = Handlebars::new();
        templates.register_template(BODY, template);
        self.templates = Some(templates);
        self
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Renders `batch` and binds it to the endpoint.
    fn prepare(&self, batch: &Batch) -> Result<Delivery, WebhookError> {
        let delivery = match &self.templates {
            Some(templates) => {
                let body = templates.render(BODY, batch)?;
                self.endpoint.delivery(&batch.key, body.into_bytes(), false)
            }
            None => self
                .endpoint
                .delivery(&batch.key, serde_json::to_vec(batch)?, true),
        };
        Ok(delivery)
    }
}

impl<T: Transport> BatchSender for HttpWebhook<T> {
    async fn send(&self, batch: &Batch) -> Result<(), WebhookError> {
        let delivery = self.prepare(batch)?;
        tracing::debug!(
            key = %delivery.key,
            bytes = delivery.body.len(),
            "Delivering batch to {} {}",
            delivery.method,
            delivery.url
        );

        self.transport.deliver(delivery).await?.into_result()
    }
}

/// Sender used by `--dry-run`: logs each batch instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSender;

impl BatchSender for DryRunSender {
    async fn send(&self, batch: &Batch) -> Result<(), WebhookError> {
        tracing::info!(
            key = %batch.key,
            count = batch.len(),
            values = ?batch.values,
            "Dry-run: batch not sent"
        );
        Ok(())
    }
}
