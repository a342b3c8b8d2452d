//! Production transport using reqwest.

use std::time::Duration;

use super::{Delivery, HttpError, Reply, Transport};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed [`Transport`]; connections are pooled across batches.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with a [`REQUEST_TIMEOUT`] per delivery.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Setup`] if reqwest cannot initialize its
    /// TLS backend or resolver.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-delivery timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Setup`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpError::Setup)?;
        Ok(Self { inner })
    }
}

impl Transport for ReqwestClient {
    async fn deliver(&self, delivery: Delivery) -> Result<Reply, HttpError> {
        let Delivery {
            key,
            method,
            url,
            headers,
            body,
        } = delivery;

        let response = self
            .inner
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    HttpError::Timeout
                } else if source.is_builder() {
                    HttpError::Request { key, source }
                } else {
                    HttpError::Connection(Box::new(source))
                }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Connection(Box::new(e)))?;

        Ok(Reply::new(status, &body))
    }
}
