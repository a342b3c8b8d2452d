//! Error types for configuration parsing and validation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::sync::ParseDelayTypeError;

/// What was being done with a config file when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Loading `--config`
    Read,
    /// Writing the `init` template
    Write,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read or written.
    #[error("Cannot {op} config file '{}': {source}", path.display())]
    File {
        /// Read or write
        op: FileOp,
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown fields.
    #[error("Config file is not valid: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field with no default was not provided.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// How to provide it
        hint: &'static str,
    },

    /// The webhook URL does not parse.
    #[error("Invalid webhook URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// The HTTP method is not a valid token.
    #[error("Invalid HTTP method '{method}'")]
    InvalidMethod {
        /// The rejected method
        method: String,
        /// Parser error
        #[source]
        source: http::method::InvalidMethod,
    },

    /// A webhook header is malformed, or has an invalid name or value.
    #[error("Invalid header '{header}': {reason}")]
    InvalidHeader {
        /// The header as given
        header: String,
        /// What is wrong with it
        reason: String,
    },

    /// The body template does not compile.
    #[error("Invalid body template: {0}")]
    InvalidTemplate(#[source] Box<handlebars::TemplateError>),

    /// Unknown delay type in a sync section.
    #[error("Invalid delay type in [{scope}]: {source}")]
    InvalidDelayType {
        /// Where the value came from (`sync`, `keys.<name>` or `cli`)
        scope: String,
        /// Underlying parse error
        #[source]
        source: ParseDelayTypeError,
    },

    /// `max_batch` of zero would flush on every input.
    #[error("Invalid max_batch in [{scope}]: must be greater than 0")]
    InvalidBatchSize {
        /// Where the value came from (`sync`, `keys.<name>` or `cli`)
        scope: String,
    },
}

/// Well-known field names for `MissingRequired` errors.
pub mod field {
    /// The webhook URL field.
    pub const URL: &str = "url";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }

    pub(super) fn file(op: FileOp, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::File {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(super) fn header(header: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidHeader {
            header: header.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns a hint for errors that `bgsync init` would help with.
    #[must_use]
    pub const fn init_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingRequired { .. }
            | Self::File {
                op: FileOp::Read, ..
            } => Some("Run 'bgsync init' to generate a configuration template."),
            _ => None,
        }
    }
}
