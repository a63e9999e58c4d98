//! `thesis-build`: reproduce the thesis PDF from sources in a disposable
//! workspace.
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod export;
mod paths;
mod pipeline;
mod quotes;
mod report;
mod runner;
mod toolchain;
mod util;
mod workspace;

use cli::{Command, RootArgs};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "THESIS_BUILD_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_logging(args.verbose());

    let result = match args.into_command() {
        Command::Build(args) => pipeline::run_build(&args),
        Command::FixQuotes(args) => quotes::run_fix_quotes(&args),
        Command::Export(args) => export::run_export(&args),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
