//! Command line for `bgsync`.
//!
//! Flags are grouped the way the config file is: webhook target flags map to
//! `[webhook]`, sync flags to `[sync]`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::sync::DelayType;

use super::toml::SyncSection;

/// bgsync: per-key event coalescer
///
/// Reads `<key> <value>` lines from stdin, batches values per key with a
/// debounce or throttle policy, and sends each batch to a webhook.
#[derive(Debug, Parser)]
#[command(name = "bgsync", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub webhook: WebhookArgs,

    #[command(flatten)]
    pub sync: SyncArgs,

    /// TOML file with [webhook], [sync] and [keys.<name>] sections
    #[arg(long, short, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log each batch instead of sending it; no URL needed
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging (RUST_LOG still wins)
    #[arg(long, short)]
    pub verbose: bool,
}

/// Where and how batches are delivered.
#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Webhook")]
pub struct WebhookArgs {
    /// Endpoint receiving each batch (required unless --dry-run)
    #[arg(long)]
    pub url: Option<String>,

    /// Request method [default: POST]
    #[arg(long)]
    pub method: Option<String>,

    /// Extra request header, 'Key=Value' or 'Key: Value'; repeatable
    #[arg(long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Sent as 'Authorization: Bearer <TOKEN>'
    #[arg(long, value_name = "TOKEN")]
    pub bearer: Option<String>,

    /// Handlebars body with key, values, count and timestamp [default: batch as JSON]
    #[arg(long = "body-template", value_name = "TEMPLATE")]
    pub body_template: Option<String>,
}

/// How values are coalesced. These override the config file for every key,
/// including keys with their own [keys.<name>] section.
#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Batching (applies to every key)")]
pub struct SyncArgs {
    /// Coalescing discipline [default: debounce]
    #[arg(long = "delay-type", value_enum)]
    pub delay_type: Option<DelayTypeArg>,

    /// Quiet period (debounce) or window length (throttle) [default: 1000]
    #[arg(long = "delay-ms", value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Send a batch as soon as it holds this many values
    #[arg(long = "max-batch", value_name = "N")]
    pub max_batch: Option<usize>,

    /// Keep sent values and resend them with the next batch
    #[arg(long = "keep-values")]
    pub keep_values: bool,
}

impl SyncArgs {
    /// The flags as a section layered over `[sync]` and `[keys.<name>]`.
    #[must_use]
    pub fn as_section(&self) -> SyncSection {
        SyncSection {
            delay_type: self
                .delay_type
                .map(|arg| DelayType::from(arg).as_str().to_string()),
            delay_ms: self.delay_ms,
            max_batch: self.max_batch,
            clear_on_execute: self.keep_values.then_some(false),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a commented config file to start from
    Init {
        /// Where to write it
        #[arg(long, short, default_value = "bgsync.toml")]
        output: PathBuf,
    },
}

/// `--delay-type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DelayTypeArg {
    /// Send once the key has been quiet for the delay
    Debounce,
    /// Send at most once per delay window
    Throttle,
}

impl From<DelayTypeArg> for DelayType {
    fn from(arg: DelayTypeArg) -> Self {
        match arg {
            DelayTypeArg::Debounce => Self::Debounce,
            DelayTypeArg::Throttle => Self::Throttle,
        }
    }
}

impl Cli {
    /// Parses `std::env::args`, exiting with usage on error.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses an explicit argument list; the first item is the binary name.
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }
}
