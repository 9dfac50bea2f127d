use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::OutputFormat;

/// Command-line arguments for `allocsim`
#[derive(Debug, Parser)]
#[command(name = "allocsim", version)]
#[command(
    about = "Run a workload under the optimistic and Banker's managers and compare them",
    long_about = None
)]
pub struct Cli {
    /// Workload file to simulate
    #[arg(value_name = "INPUT", help = "Workload file to simulate")]
    pub input: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(long, value_name = "PATH", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format, overriding the configuration file
    #[arg(long, value_enum, help = "Output format (overrides config)")]
    pub format: Option<OutputFormat>,

    /// Suppress the diagnostics printed before the report
    #[arg(long, help = "Do not print diagnostics")]
    pub no_diagnostics: bool,

    /// Log verbosity: once for debug, twice for trace
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    pub verbose: u8,
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "Test code is allowed to use expect")]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "allocsim",
            "input.txt",
            "--format",
            "json",
            "--no-diagnostics",
            "-vv",
        ])
        .expect("arguments are valid");

        assert_eq!(cli.input, Some(PathBuf::from("input.txt")));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.no_diagnostics);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_input_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["allocsim"]).expect("no arguments parse");
        assert!(cli.input.is_none());
        assert!(cli.format.is_none());
    }
}
