//! bgsync: batch stdin events per key and deliver them to a webhook.

use std::path::Path;
use std::process::ExitCode;

use bgsync::config::{Cli, Command, ValidatedConfig, write_default_config};

mod app;
mod run;

use app::Exit;

#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let exit = match &cli.command {
        Some(Command::Init { output }) => init(output),
        None => serve(&cli),
    };
    exit.into()
}

/// Writes the commented config template for `bgsync init`.
fn init(output: &Path) -> Exit {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            Exit::Success
        }
        Err(e) => app::config_failed(&e),
    }
}

/// Batches stdin until EOF or a shutdown signal.
#[cfg(not(tarpaulin_include))]
fn serve(cli: &Cli) -> Exit {
    let config = match ValidatedConfig::load(cli) {
        Ok(config) => config,
        Err(e) => return app::config_failed(&e),
    };

    app::init_tracing(config.verbose);
    tracing::info!("{config}");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return Exit::Runtime;
        }
    };

    match runtime.block_on(run::execute(config)) {
        Ok(()) => Exit::Success,
        Err(e) => app::run_failed(&e),
    }
}
