//! Tests for validated configuration.

use std::io::Write;
use std::time::Duration;

use http::Method;
use tempfile::{NamedTempFile, tempdir};

use super::{ConfigError, FileOp};
use super::cli::Cli;
use super::toml::TomlConfig;
use super::validated::{SyncPolicy, ValidatedConfig, write_default_config};
use crate::sync::DelayType;

/// Helper to create CLI args from a slice
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["bgsync"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

mod url {
    use super::*;

    #[test]
    fn missing_url_is_an_error() {
        let result = ValidatedConfig::from_raw(&cli(&[]), None);

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequired { field: "url", .. })
        ));
    }

    #[test]
    fn dry_run_does_not_need_url() {
        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), None).unwrap();

        assert!(config.url.is_none());
        assert!(config.dry_run);
    }

    #[test]
    fn url_from_toml() {
        let toml = toml(
            r#"
            [webhook]
            url = "https://example.com/sync"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();

        assert_eq!(config.url.unwrap().as_str(), "https://example.com/sync");
    }

    #[test]
    fn cli_url_overrides_toml() {
        let toml = toml(
            r#"
            [webhook]
            url = "https://toml.example.com"
        "#,
        );

        let config =
            ValidatedConfig::from_raw(&cli(&["--url", "https://cli.example.com"]), Some(&toml))
                .unwrap();

        assert_eq!(config.url.unwrap().host_str(), Some("cli.example.com"));
    }

    #[test]
    fn invalid_url_is_an_error() {
        let result = ValidatedConfig::from_raw(&cli(&["--url", "not a url"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }
}

mod webhook {
    use super::*;

    #[test]
    fn method_defaults_to_post() {
        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), None).unwrap();
        assert_eq!(config.method, Method::POST);
    }

    #[test]
    fn cli_method_overrides_toml() {
        let toml = toml("[webhook]\nmethod = \"PATCH\"\n");

        let from_toml = ValidatedConfig::from_raw(&cli(&["--dry-run"]), Some(&toml)).unwrap();
        assert_eq!(from_toml.method, Method::PATCH);

        let from_cli =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--method", "PUT"]), Some(&toml))
                .unwrap();
        assert_eq!(from_cli.method, Method::PUT);
    }

    #[test]
    fn invalid_method_is_an_error() {
        let result = ValidatedConfig::from_raw(&cli(&["--dry-run", "--method", "GE T"]), None);
        assert!(matches!(result, Err(ConfigError::InvalidMethod { .. })));
    }

    #[test]
    fn headers_are_merged_with_cli_winning() {
        let toml = toml(
            r#"
            [webhook.headers]
            X-Source = "toml"
            X-Only-Toml = "yes"
        "#,
        );

        let config = ValidatedConfig::from_raw(
            &cli(&["--dry-run", "--header", "X-Source: cli"]),
            Some(&toml),
        )
        .unwrap();

        assert_eq!(config.headers["x-source"], "cli");
        assert_eq!(config.headers["x-only-toml"], "yes");
    }

    #[test]
    fn bearer_sets_authorization_header() {
        let config =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--bearer", "abc"]), None).unwrap();

        assert_eq!(config.headers[http::header::AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn colon_header_value_may_contain_equals() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--dry-run", "--header", "X-Signature: sha256=abc"]),
            None,
        )
        .unwrap();

        assert_eq!(config.headers["x-signature"], "sha256=abc");
    }

    #[test]
    fn equals_header_value_may_contain_colon_and_padding() {
        let config = ValidatedConfig::from_raw(
            &cli(&[
                "--dry-run",
                "--header",
                "X-Token=dG9rZW4=:v1==",
                "--header",
                "X-Trace: a:b",
            ]),
            None,
        )
        .unwrap();

        assert_eq!(config.headers["x-token"], "dG9rZW4=:v1==");
        assert_eq!(config.headers["x-trace"], "a:b");
    }

    #[test]
    fn invalid_header_name_names_header() {
        let result =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--header", "Bad Name: x"]), None);

        match result {
            Err(ConfigError::InvalidHeader { header, .. }) => assert_eq!(header, "Bad Name"),
            other => panic!("Expected InvalidHeader, got {other:?}"),
        }
    }

    #[test]
    fn malformed_header_is_an_error() {
        let result = ValidatedConfig::from_raw(&cli(&["--dry-run", "--header", "NoSeparator"]), None);
        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }

    #[test]
    fn invalid_template_is_an_error() {
        let result =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--body-template", "{{#each values}}"]), None);
        assert!(matches!(result, Err(ConfigError::InvalidTemplate(_))));
    }

    #[test]
    fn valid_template_is_compiled() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--dry-run", "--body-template", "{{key}}: {{count}}"]),
            None,
        )
        .unwrap();

        assert!(config.body_template.is_some());
    }

    #[test]
    fn cli_template_overrides_toml() {
        let toml = toml("[webhook]\nbody_template = \"{{#each values}}\"\n");

        let config = ValidatedConfig::from_raw(
            &cli(&["--dry-run", "--body-template", "{{count}}"]),
            Some(&toml),
        );

        assert!(config.is_ok());
    }
}

mod policies {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), None).unwrap();

        assert_eq!(config.policies.default, SyncPolicy::default());
        assert_eq!(config.policies.default.delay_type, DelayType::Debounce);
        assert_eq!(config.policies.default.delay, Duration::from_secs(1));
        assert!(config.policies.default.clear_on_execute);
        assert!(config.policies.default.max_batch.is_none());
    }

    #[test]
    fn sync_section_sets_default_policy() {
        let toml = toml(
            r#"
            [sync]
            delay_type = "throttle"
            delay_ms = 250
            max_batch = 5
            clear_on_execute = false
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), Some(&toml)).unwrap();
        let policy = &config.policies.default;

        assert_eq!(policy.delay_type, DelayType::Throttle);
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(policy.max_batch, Some(5));
        assert!(!policy.clear_on_execute);
    }

    #[test]
    fn cli_overrides_sync_section() {
        let toml = toml(
            r#"
            [sync]
            delay_type = "throttle"
            delay_ms = 250
        "#,
        );

        let config = ValidatedConfig::from_raw(
            &cli(&[
                "--dry-run",
                "--delay-type",
                "debounce",
                "--delay-ms",
                "40",
                "--max-batch",
                "3",
                "--keep-values",
            ]),
            Some(&toml),
        )
        .unwrap();
        let policy = &config.policies.default;

        assert_eq!(policy.delay_type, DelayType::Debounce);
        assert_eq!(policy.delay, Duration::from_millis(40));
        assert_eq!(policy.max_batch, Some(3));
        assert!(!policy.clear_on_execute);
    }

    #[test]
    fn zero_delay_is_allowed() {
        let config =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--delay-ms", "0"]), None).unwrap();
        assert_eq!(config.policies.default.delay, Duration::ZERO);
    }

    #[test]
    fn key_override_replaces_only_named_fields() {
        let toml = toml(
            r#"
            [sync]
            delay_ms = 100
            max_batch = 10

            [keys.orders]
            delay_type = "throttle"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), Some(&toml)).unwrap();
        let orders = config.policies.for_key("orders");

        assert_eq!(orders.delay_type, DelayType::Throttle);
        assert_eq!(orders.delay, Duration::from_millis(100));
        assert_eq!(orders.max_batch, Some(10));
    }

    #[test]
    fn cli_flags_beat_key_override() {
        let toml = toml(
            r#"
            [keys.orders]
            delay_ms = 900
            delay_type = "throttle"
            clear_on_execute = true
        "#,
        );

        let config = ValidatedConfig::from_raw(
            &cli(&["--dry-run", "--delay-ms", "50", "--keep-values"]),
            Some(&toml),
        )
        .unwrap();
        let orders = config.policies.for_key("orders");

        assert_eq!(orders.delay, Duration::from_millis(50));
        assert!(!orders.clear_on_execute);
        assert_eq!(orders.delay_type, DelayType::Throttle);
        assert_eq!(config.policies.for_key("other").delay, Duration::from_millis(50));
    }

    #[test]
    fn cli_max_batch_applies_to_key_override() {
        let toml = toml("[keys.orders]\nmax_batch = 100\n");

        let config =
            ValidatedConfig::from_raw(&cli(&["--dry-run", "--max-batch", "3"]), Some(&toml))
                .unwrap();

        assert_eq!(config.policies.for_key("orders").max_batch, Some(3));
    }

    #[test]
    fn unknown_key_uses_default_policy() {
        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), None).unwrap();

        assert_eq!(config.policies.for_key("anything"), &config.policies.default);
    }

    #[test]
    fn unknown_delay_type_names_scope() {
        let toml = toml("[keys.orders]\ndelay_type = \"eventually\"\n");

        let result = ValidatedConfig::from_raw(&cli(&["--dry-run"]), Some(&toml));

        match result {
            Err(ConfigError::InvalidDelayType { scope, .. }) => assert_eq!(scope, "keys.orders"),
            other => panic!("Expected InvalidDelayType, got {other:?}"),
        }
    }

    #[test]
    fn zero_max_batch_is_an_error() {
        let from_toml = ValidatedConfig::from_raw(
            &cli(&["--dry-run"]),
            Some(&toml("[sync]\nmax_batch = 0\n")),
        );
        assert!(matches!(
            from_toml,
            Err(ConfigError::InvalidBatchSize { ref scope }) if scope == "sync"
        ));

        let from_cli = ValidatedConfig::from_raw(&cli(&["--dry-run", "--max-batch", "0"]), None);
        assert!(matches!(
            from_cli,
            Err(ConfigError::InvalidBatchSize { ref scope }) if scope == "cli"
        ));
    }

    #[test]
    fn policy_display_is_compact() {
        let policy = SyncPolicy {
            delay_type: DelayType::Throttle,
            delay: Duration::from_millis(200),
            max_batch: Some(4),
            clear_on_execute: false,
        };

        assert_eq!(policy.to_string(), "throttle 200ms max_batch=4 keep-values");
        assert_eq!(SyncPolicy::default().to_string(), "debounce 1000ms");
    }
}

mod loading {
    use super::*;

    #[test]
    fn load_reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[webhook]\nurl = \"https://example.com/hook\"").unwrap();
        writeln!(file, "[sync]\ndelay_type = \"throttle\"").unwrap();

        let path = file.path().to_str().unwrap();
        let config = ValidatedConfig::load(&cli(&["--config", path])).unwrap();

        assert_eq!(config.url.unwrap().as_str(), "https://example.com/hook");
        assert_eq!(config.policies.default.delay_type, DelayType::Throttle);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let result = ValidatedConfig::load(&cli(&["--config", "/nonexistent/bgsync.toml"]));
        assert!(matches!(
            result,
            Err(ConfigError::File {
                op: FileOp::Read,
                ..
            })
        ));
    }

    #[test]
    fn written_template_loads_in_dry_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bgsync.toml");

        write_default_config(&path).unwrap();
        let config =
            ValidatedConfig::load(&cli(&["--dry-run", "--config", path.to_str().unwrap()]))
                .unwrap();

        assert_eq!(config.policies.default, SyncPolicy::default());
    }

    #[test]
    fn write_to_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("bgsync.toml");

        let result = write_default_config(&path);
        assert!(matches!(
            result,
            Err(ConfigError::File {
                op: FileOp::Write,
                ..
            })
        ));
    }

    #[test]
    fn display_summarizes_config() {
        let config = ValidatedConfig::from_raw(&cli(&["--dry-run"]), None).unwrap();
        let display = config.to_string();

        assert!(display.contains("url: none"));
        assert!(display.contains("debounce 1000ms"));
        assert!(display.contains("dry_run: true"));
    }
}
