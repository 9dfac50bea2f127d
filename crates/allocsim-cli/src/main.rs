//! `allocsim`: compare optimistic and Banker's resource allocation on a
//! workload file.
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

use anyhow::{Result, bail};
use clap::Parser as _;
use cli::Cli;
use config::Config;

mod cli;
mod config;
mod handlers;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli
        .config
        .as_deref()
        .map_or_else(|| Ok(Config::default()), Config::load_from_file)?
        .with_overrides(cli.format, cli.no_diagnostics);

    handlers::init_logging(&config.logging, cli.verbose);

    let Some(input) = cli.input else {
        bail!("no input file given");
    };
    handlers::handle_simulation(&input, &config.report)
}
