//! Process outcome, error reporting and logging setup for the binary.

use std::process::ExitCode;

use bgsync::config::ConfigError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::run::RunError;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Input drained or shutdown requested
    Success,
    /// Bad arguments, missing URL or unreadable config file
    Config,
    /// Startup or stdin failure after the config was accepted
    Runtime,
}

impl Exit {
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Config => 1,
            Self::Runtime => 2,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit.code())
    }
}

/// Prints a rejected configuration, with a hint when `init` would help.
pub fn config_failed(error: &ConfigError) -> Exit {
    eprintln!("Configuration error: {error}");
    if let Some(hint) = error.init_hint() {
        eprintln!("\n{hint}");
    }
    Exit::Config
}

/// Logs a failed run; tracing is already set up at this point.
pub fn run_failed(error: &RunError) -> Exit {
    tracing::error!("{error}");
    Exit::Runtime
}

/// Default log level; `RUST_LOG` takes precedence.
const fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

/// Installs the stderr subscriber so stdout stays free for `init` output.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
