//! Where `bgsync` gets its settings: flags, an optional TOML file and
//! built-in [`defaults`], merged into a [`ValidatedConfig`].
//!
//! Webhook settings resolve as CLI > `[webhook]` > defaults.
//!
//! # Per-key policies
//!
//! The `[sync]` section forms the default policy. A `[keys.<name>]` section
//! starts from it and replaces only the fields it sets. The `--delay-type`,
//! `--delay-ms`, `--max-batch` and `--keep-values` flags are applied last, to
//! the default and to every key policy alike.
//!
//! `--keep-values` can only turn `clear_on_execute` off; there is no flag to
//! turn it back on over a file that disabled it.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, DelayTypeArg, SyncArgs, WebhookArgs};
pub use error::{ConfigError, FileOp, field};
pub use toml::{SyncSection, TomlConfig, WebhookSection, default_config_template};
pub use validated::{SyncPolicies, SyncPolicy, ValidatedConfig, write_default_config};
