//! Merged, checked configuration and the per-key sync policies.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use handlebars::Template;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use crate::sync::DelayType;

use super::cli::{Cli, SyncArgs, WebhookArgs};
use super::defaults;
use super::error::{ConfigError, FileOp, field};
use super::toml::{SyncSection, TomlConfig, WebhookSection};

/// Coalescing policy resolved for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Debounce or throttle
    pub delay_type: DelayType,

    /// Quiet period or window length
    pub delay: Duration,

    /// Send immediately once this many values are pending
    pub max_batch: Option<usize>,

    /// Start a fresh batch after each send
    pub clear_on_execute: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            delay_type: defaults::DELAY_TYPE,
            delay: defaults::delay(),
            max_batch: None,
            clear_on_execute: defaults::CLEAR_ON_EXECUTE,
        }
    }
}

impl SyncPolicy {
    /// Returns a copy with every field set in `section` applied.
    fn overridden_by(&self, section: &SyncSection, scope: &str) -> Result<Self, ConfigError> {
        let delay_type = match section.delay_type.as_deref() {
            Some(value) => parse_delay_type(value, scope)?,
            None => self.delay_type,
        };

        let max_batch = match section.max_batch {
            Some(size) => Some(validate_batch_size(size, scope)?),
            None => self.max_batch,
        };

        Ok(Self {
            delay_type,
            delay: section.delay_ms.map_or(self.delay, Duration::from_millis),
            max_batch,
            clear_on_execute: section.clear_on_execute.unwrap_or(self.clear_on_execute),
        })
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}ms", self.delay_type, self.delay.as_millis())?;
        if let Some(max) = self.max_batch {
            write!(f, " max_batch={max}")?;
        }
        if !self.clear_on_execute {
            f.write_str(" keep-values")?;
        }
        Ok(())
    }
}

/// The default policy plus per-key overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPolicies {
    /// Policy for keys without an override
    pub default: SyncPolicy,

    /// Per-key policies
    pub keys: HashMap<String, SyncPolicy>,
}

impl SyncPolicies {
    /// Returns the policy that applies to `key`.
    #[must_use]
    pub fn for_key(&self, key: &str) -> &SyncPolicy {
        self.keys.get(key).unwrap_or(&self.default)
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Webhook URL, `None` only in dry-run mode
    pub url: Option<Url>,

    /// HTTP method for webhook requests
    pub method: Method,

    /// HTTP headers for webhook requests
    pub headers: HeaderMap,

    /// Compiled Handlebars body template (optional)
    pub body_template: Option<Template>,

    /// Coalescing policies
    pub policies: SyncPolicies,

    /// Dry-run mode (log batches without sending webhooks)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url_str = self
            .url
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string);

        write!(
            f,
            "Config {{ url: {}, method: {}, policy: {}, key_overrides: {}, dry_run: {} }}",
            url_str,
            self.method,
            self.policies.default,
            self.policies.keys.len(),
            self.dry_run,
        )
    }
}

impl ValidatedConfig {
    /// Merges CLI arguments over an optional config file.
    ///
    /// Webhook fields resolve as CLI > `[webhook]` > defaults; sync fields as
    /// CLI > `[keys.<name>]` > `[sync]` > defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is missing outside dry-run mode, or is invalid
    /// - A delay type is unknown or `max_batch` is zero
    /// - A header, the method or the body template is invalid
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let empty = WebhookSection::default();
        let file = toml.map_or(&empty, |t| &t.webhook);
        let args = &cli.webhook;

        let url = match args.url.as_deref().or(file.url.as_deref()) {
            Some(url) => Some(parse_url(url)?),
            None if cli.dry_run => None,
            None => {
                return Err(ConfigError::missing(
                    field::URL,
                    "Use --url, set webhook.url in config file, or pass --dry-run",
                ));
            }
        };

        let method = args
            .method
            .as_deref()
            .or(file.method.as_deref())
            .unwrap_or(defaults::METHOD);

        let body_template = args
            .body_template
            .as_deref()
            .or(file.body_template.as_deref())
            .map(compile_template)
            .transpose()?;

        Ok(Self {
            url,
            method: parse_method(method)?,
            headers: collect_headers(args, file)?,
            body_template,
            policies: resolve_policies(&cli.sync, toml)?,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Like [`from_raw`](Self::from_raw), reading `--config` first if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or the
    /// merged configuration is invalid.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = cli.config.as_deref().map(TomlConfig::load).transpose()?;
        Self::from_raw(cli, toml.as_ref())
    }
}

/// Layers `[sync]`, each `[keys.<name>]` and finally the CLI sync flags.
fn resolve_policies(
    args: &SyncArgs,
    toml: Option<&TomlConfig>,
) -> Result<SyncPolicies, ConfigError> {
    let flags = args.as_section();
    let base = match toml {
        Some(toml) => SyncPolicy::default().overridden_by(&toml.sync, "sync")?,
        None => SyncPolicy::default(),
    };

    let mut keys = HashMap::new();
    for (key, section) in toml.map(|t| &t.keys).into_iter().flatten() {
        let policy = base
            .overridden_by(section, &format!("keys.{key}"))?
            .overridden_by(&flags, "cli")?;
        keys.insert(key.clone(), policy);
    }

    Ok(SyncPolicies {
        default: base.overridden_by(&flags, "cli")?,
        keys,
    })
}

/// `[webhook.headers]`, then `--header` flags, then the bearer token.
fn collect_headers(args: &WebhookArgs, file: &WebhookSection) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();

    for (name, value) in &file.headers {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    for header in &args.headers {
        let (name, value) = split_header(header)?;
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    if let Some(token) = args.bearer.as_deref().or(file.bearer.as_deref()) {
        let (_, value) = parse_header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::file(FileOp::Write, path, e))
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

fn parse_method(method: &str) -> Result<Method, ConfigError> {
    method
        .parse::<Method>()
        .map_err(|source| ConfigError::InvalidMethod {
            method: method.to_string(),
            source,
        })
}

fn compile_template(source: &str) -> Result<Template, ConfigError> {
    Template::compile(source).map_err(|e| ConfigError::InvalidTemplate(Box::new(e)))
}

fn parse_delay_type(value: &str, scope: &str) -> Result<DelayType, ConfigError> {
    value
        .parse::<DelayType>()
        .map_err(|source| ConfigError::InvalidDelayType {
            scope: scope.to_string(),
            source,
        })
}

fn validate_batch_size(size: usize, scope: &str) -> Result<usize, ConfigError> {
    if size == 0 {
        return Err(ConfigError::InvalidBatchSize {
            scope: scope.to_string(),
        });
    }
    Ok(size)
}

/// Splits `Key=Value` or `Key: Value` at whichever separator comes first,
/// so values may contain the other one (`X-Signature: sha256=abc`).
fn split_header(header: &str) -> Result<(&str, &str), ConfigError> {
    let at = header
        .find(['=', ':'])
        .ok_or_else(|| ConfigError::header(header, "expected 'Key=Value' or 'Key: Value'"))?;
    Ok((header[..at].trim(), header[at + 1..].trim()))
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let header_name = name
        .parse::<HeaderName>()
        .map_err(|e| ConfigError::header(name, e))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| ConfigError::header(name, format!("bad value: {e}")))?;
    Ok((header_name, header_value))
}
