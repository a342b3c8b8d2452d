//! Error types for webhook delivery.

use thiserror::Error;

/// Error type for the transport: no reply was received.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The HTTP client could not be constructed (TLS backend, resolver).
    #[error("Failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    /// The delivery could not be turned into a request.
    #[error("Cannot build request for key '{key}': {source}")]
    Request {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    /// Network connection failed (DNS, refused connection, reset).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Request timed out")]
    Timeout,
}

/// Error type for sending one batch.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The delivery never got a reply.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered with a non-2xx status.
    #[error("Webhook returned {status}")]
    NonSuccessStatus {
        status: http::StatusCode,
        /// Reply body excerpt, if any
        body: Option<String>,
    },

    /// The body template failed to render for this batch.
    #[error("Template rendering failed: {0}")]
    Template(#[source] Box<handlebars::RenderError>),

    /// The default JSON body could not be encoded.
    #[error("Failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<handlebars::RenderError> for WebhookError {
    fn from(error: handlebars::RenderError) -> Self {
        Self::Template(Box::new(error))
    }
}
