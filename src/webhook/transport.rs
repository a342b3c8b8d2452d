//! What one batch delivery looks like on the wire.
//!
//! [`Endpoint`] is the configured target, [`Delivery`] is one rendered
//! batch bound for it and [`Reply`] is what came back. A [`Transport`]
//! moves deliveries; the production one is
//! [`ReqwestClient`](super::ReqwestClient).

use std::future::Future;

use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use super::{HttpError, WebhookError};

/// Longest reply body kept for error reports, in bytes.
pub const REPLY_EXCERPT_LIMIT: usize = 512;

/// Where batches are delivered.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Target URL
    pub url: Url,
    /// HTTP method, `POST` unless configured
    pub method: Method,
    /// Headers sent with every batch
    pub headers: HeaderMap,
}

impl Endpoint {
    /// Creates a `POST` endpoint without extra headers.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::POST,
            headers: HeaderMap::new(),
        }
    }

    /// Binds a rendered body for `key` to this endpoint.
    ///
    /// A JSON body gets `Content-Type: application/json` unless the
    /// configured headers already name a content type.
    #[must_use]
    pub fn delivery(&self, key: &str, body: Vec<u8>, json: bool) -> Delivery {
        let mut headers = self.headers.clone();
        if json && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Delivery {
            key: key.to_string(),
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body,
        }
    }
}

/// One rendered batch ready to go out.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Key the batch belongs to
    pub key: String,
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Status and body excerpt returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    /// Lossy UTF-8, cut to [`REPLY_EXCERPT_LIMIT`] bytes
    pub body: String,
}

impl Reply {
    #[must_use]
    pub fn new(status: StatusCode, body: &[u8]) -> Self {
        let mut text = String::from_utf8_lossy(body).into_owned();
        if text.len() > REPLY_EXCERPT_LIMIT {
            let mut end = REPLY_EXCERPT_LIMIT;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Self { status, body: text }
    }

    /// Maps a non-2xx status to [`WebhookError::NonSuccessStatus`].
    ///
    /// # Errors
    ///
    /// Returns the status and, when non-empty, the body excerpt.
    pub fn into_result(self) -> Result<(), WebhookError> {
        if self.status.is_success() {
            return Ok(());
        }

        Err(WebhookError::NonSuccessStatus {
            status: self.status,
            body: (!self.body.trim().is_empty()).then_some(self.body),
        })
    }
}

/// Moves a [`Delivery`] to its endpoint.
///
/// Any reply counts as delivered here; status handling belongs to the caller.
pub trait Transport: Send + Sync {
    /// Sends one delivery and reads the reply.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if no reply was received.
    fn deliver(&self, delivery: Delivery) -> impl Future<Output = Result<Reply, HttpError>> + Send;
}
