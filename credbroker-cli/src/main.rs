//! # credbroker CLI Entry Point
//!
//! The main entry point for the credbroker command-line tool.

use clap::Parser;
use credbroker_cli::cli::{Cli, exit_code, handle_cli};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
  let cmd = Cli::parse();

  let level = match cmd.verbose {
    0 => tracing::Level::WARN,  // Default: warnings and errors
    1 => tracing::Level::INFO,  // -v: info, warnings, and errors
    2 => tracing::Level::DEBUG, // -vv: debug, info, warnings, and errors
    _ => tracing::Level::TRACE, // -vvv or more: trace and everything else
  };

  // Logs go to stderr; stdout carries credentials for calling scripts.
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::from_default_env().add_directive(level.into()))
    .init();

  debug!("Tracing initialized with level: {}", level);

  if let Err(err) = handle_cli(cmd) {
    eprintln!("Error: {err:?}");
    std::process::exit(exit_code(&err));
  }
}
