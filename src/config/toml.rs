//! The `--config` file: `[webhook]`, `[sync]` and `[keys.<name>]`.
//!
//! Every field is optional; anything left out falls back to the CLI or the
//! built-in defaults. Unknown fields are rejected so typos surface at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use super::error::FileOp;

/// Parsed config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub webhook: WebhookSection,

    /// Policy for keys without their own section
    #[serde(default)]
    pub sync: SyncSection,

    /// `[keys.<name>]` sections, layered over `[sync]`
    #[serde(default)]
    pub keys: HashMap<String, SyncSection>,
}

/// `[webhook]`: the endpoint batches are delivered to.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    pub url: Option<String>,
    pub method: Option<String>,

    /// `[webhook.headers]`, one entry per header
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Token for `Authorization: Bearer`
    pub bearer: Option<String>,

    /// Handlebars source rendered once per batch
    pub body_template: Option<String>,
}

/// Coalescing fields shared by `[sync]` and `[keys.<name>]`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// "debounce" or "throttle"
    pub delay_type: Option<String>,

    /// Quiet period or window, in milliseconds
    pub delay_ms: Option<u64>,

    /// Send as soon as this many values are pending
    pub max_batch: Option<usize>,

    /// Whether a send starts a new, empty batch
    pub clear_on_execute: Option<bool>,
}

impl TomlConfig {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::File`] if the file cannot be read, or
    /// [`ConfigError::TomlParse`] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        std::fs::read_to_string(path)
            .map_err(|e| ConfigError::file(FileOp::Read, path, e))
            .and_then(|content| Self::parse(&content))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::TomlParse`] on syntax errors, wrong types or
    /// unknown fields.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

const CONFIG_TEMPLATE: &str = r#"# bgsync configuration
#
# bgsync reads "<key> <value>" lines on stdin, collects the values of each
# key into a batch and delivers the batch to the webhook below.
# Flags given on the command line override this file.

[webhook]
# Endpoint receiving each batch. Required unless --dry-run is given.
# url = "https://api.example.com/sync"

# Request method, POST by default.
# method = "PUT"

# Extra request headers.
# [webhook.headers]
# X-Source = "bgsync"

# Adds "Authorization: Bearer <token>".
# bearer = "your-token-here"

# Request body. By default the batch is sent as JSON:
#   {"key": "orders", "values": ["a", "b"], "count": 2, "timestamp": 1700000000}
# A Handlebars template may use {{key}}, {{values}}, {{count}} and {{timestamp}}.
# body_template = '{"text": "{{count}} new {{key}}: {{#each values}}{{this}} {{/each}}"}'

[sync]
# debounce: send once a key has been quiet for delay_ms.
# throttle: send at most once per delay_ms window.
delay_type = "debounce"
delay_ms = 1000

# Send early once a key has this many values pending. Unlimited by default.
# max_batch = 100

# Set to false to keep sent values and resend them with the next batch.
# clear_on_execute = true

# Keys may override any [sync] field. CLI batching flags still win.
# [keys.orders]
# delay_type = "throttle"
# delay_ms = 5000
"#;

/// The commented file written by `bgsync init`.
#[must_use]
pub const fn default_config_template() -> &'static str {
    CONFIG_TEMPLATE
}
