//! Tests for CLI argument parsing.

use super::cli::{Cli, Command, DelayTypeArg, SyncArgs};
use crate::sync::DelayType;

mod parsing {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;

        Cli::command().debug_assert();
    }

    #[test]
    fn parse_minimal_args() {
        let cli = Cli::parse_from_iter(["bgsync", "--url", "https://example.com/sync"]);

        assert_eq!(cli.webhook.url.as_deref(), Some("https://example.com/sync"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_http_options() {
        let cli = Cli::parse_from_iter([
            "bgsync",
            "--url",
            "https://example.com",
            "--method",
            "PUT",
            "--header",
            "X-Api-Key=secret",
            "--header",
            "Content-Type: application/json",
            "--bearer",
            "token123",
            "--body-template",
            r#"{"key":"{{key}}"}"#,
        ]);

        assert_eq!(cli.webhook.method.as_deref(), Some("PUT"));
        assert_eq!(cli.webhook.headers.len(), 2);
        assert_eq!(cli.webhook.headers[0], "X-Api-Key=secret");
        assert_eq!(cli.webhook.headers[1], "Content-Type: application/json");
        assert_eq!(cli.webhook.bearer.as_deref(), Some("token123"));
        assert_eq!(cli.webhook.body_template.as_deref(), Some(r#"{"key":"{{key}}"}"#));
    }

    #[test]
    fn parse_sync_options() {
        let cli = Cli::parse_from_iter([
            "bgsync",
            "--delay-type",
            "throttle",
            "--delay-ms",
            "250",
            "--max-batch",
            "20",
            "--keep-values",
        ]);

        assert_eq!(cli.sync.delay_type, Some(DelayTypeArg::Throttle));
        assert_eq!(cli.sync.delay_ms, Some(250));
        assert_eq!(cli.sync.max_batch, Some(20));
        assert!(cli.sync.keep_values);
    }

    #[test]
    fn parse_both_delay_types() {
        let debounce = Cli::parse_from_iter(["bgsync", "--delay-type", "debounce"]);
        assert_eq!(debounce.sync.delay_type, Some(DelayTypeArg::Debounce));

        let throttle = Cli::parse_from_iter(["bgsync", "--delay-type", "throttle"]);
        assert_eq!(throttle.sync.delay_type, Some(DelayTypeArg::Throttle));
    }

    #[test]
    fn unknown_delay_type_is_rejected() {
        use clap::Parser;

        let result = Cli::try_parse_from(["bgsync", "--delay-type", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_misc_options() {
        let cli = Cli::parse_from_iter([
            "bgsync",
            "--config",
            "/path/to/config.toml",
            "--dry-run",
            "--verbose",
        ]);

        assert_eq!(
            cli.config.as_ref().unwrap().to_str(),
            Some("/path/to/config.toml")
        );
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from_iter(["bgsync"]);

        assert!(cli.webhook.url.is_none());
        assert!(cli.webhook.method.is_none());
        assert!(cli.sync.delay_type.is_none());
        assert!(cli.sync.delay_ms.is_none());
        assert!(cli.sync.max_batch.is_none());
        assert!(!cli.sync.keep_values);
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(cli.webhook.headers.is_empty());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::parse_from_iter(["bgsync", "-c", "bgsync.toml", "-v"]);

        assert!(cli.config.is_some());
        assert!(cli.verbose);
    }
}

mod delay_type_arg {
    use super::*;

    #[test]
    fn converts_to_delay_type() {
        assert_eq!(DelayType::from(DelayTypeArg::Debounce), DelayType::Debounce);
        assert_eq!(DelayType::from(DelayTypeArg::Throttle), DelayType::Throttle);
    }
}

mod sync_args {
    use super::*;

    #[test]
    fn unset_flags_leave_section_empty() {
        let section = SyncArgs::default().as_section();

        assert!(section.delay_type.is_none());
        assert!(section.delay_ms.is_none());
        assert!(section.max_batch.is_none());
        assert!(section.clear_on_execute.is_none());
    }

    #[test]
    fn set_flags_become_section_fields() {
        let cli = Cli::parse_from_iter([
            "bgsync",
            "--delay-type",
            "throttle",
            "--delay-ms",
            "75",
            "--max-batch",
            "4",
            "--keep-values",
        ]);

        let section = cli.sync.as_section();

        assert_eq!(section.delay_type.as_deref(), Some("throttle"));
        assert_eq!(section.delay_ms, Some(75));
        assert_eq!(section.max_batch, Some(4));
        assert_eq!(section.clear_on_execute, Some(false));
    }
}

mod init_command {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_init_with_default_output() {
        let cli = Cli::parse_from_iter(["bgsync", "init"]);

        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("bgsync.toml"));
            }
            None => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_custom_output() {
        let cli = Cli::parse_from_iter(["bgsync", "init", "--output", "/custom/path/config.toml"]);

        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("/custom/path/config.toml"));
            }
            None => panic!("Expected Init command"),
        }
    }

    #[test]
    fn run_mode_has_no_command() {
        let cli = Cli::parse_from_iter(["bgsync", "--dry-run"]);
        assert!(cli.command.is_none());
    }
}
