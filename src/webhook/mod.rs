//! Webhook layer for delivering flushed batches to external services.
//!
//! A flushed [`Batch`] is rendered by a [`BatchSender`] into a
//! [`Delivery`] for the configured [`Endpoint`]. A [`Transport`]
//! ([`ReqwestClient`] in production) sends it and returns a [`Reply`].
//! [`DryRunSender`] only logs.

mod batch;
mod client;
mod error;
mod sender;
mod transport;


pub use batch::Batch;
pub use client::{REQUEST_TIMEOUT, ReqwestClient};
pub use error::{HttpError, WebhookError};
pub use sender::{BatchSender, DryRunSender, HttpWebhook};
pub use transport::{Delivery, Endpoint, REPLY_EXCERPT_LIMIT, Reply, Transport};
