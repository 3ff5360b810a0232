use std::{io, process::ExitCode};

use clap::Parser;
use glossa::cli::{Arguments, ExitStatus};
use tracing_subscriber::EnvFilter;

/// Overrides the log filter, e.g. `GLOSSA_LOG=glossa::template=trace`.
const LOG_ENV: &str = "GLOSSA_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_tracing(args.verbose());

    match glossa::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
