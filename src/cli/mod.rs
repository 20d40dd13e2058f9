use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod commands;
mod exit_status;
pub mod report;
mod run;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let verbose = args.verbose();
    init_tracing(verbose);

    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };

    let result = run::run(args)?;
    report::print(&result, verbose);

    Ok(result.status.into())
}

/// Diagnostics go to stderr. `RUST_LOG` wins; otherwise `warn`, or `debug`
/// for this crate with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,hanzi_i18n=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
