//! Command-line interface for headertest
//!
//! clap-derived argument parsing, logging setup and dispatch to the commands in
//! [`commands`].

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::Output;

/// Check that every header compiles on its own
#[derive(Parser)]
#[command(
    name = "headertest",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check that every C/C++ header compiles as a standalone translation unit",
    long_about = "headertest wraps each header in a one-line translation unit and compiles it \
                  on its own, catching missing includes and other hidden dependencies."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every header as its own translation unit
    Check(commands::check::CheckArgs),
    /// List the headers that would be checked
    List(commands::list::ListArgs),
    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Change directory if specified
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);
        let config_path = self.config.as_deref();

        match self.command {
            Commands::Check(args) => commands::check::execute(args, config_path, &output).await,
            Commands::List(args) => commands::list::execute(args, config_path, &output).await,
            Commands::Config(cmd) => commands::config::execute(cmd, config_path, &output).await,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs go to stderr so they never mix with the summary or JSON on stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_check_with_globals() {
        let cli = Cli::try_parse_from([
            "headertest", "-vv", "--config", "ci.json", "check", "--batch-size", "4", "a.h",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("ci.json"));
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.headers, vec!["a.h"]);
                assert_eq!(args.batch_size, Some(crate::config::BatchSize::Fixed(4)));
            }
            _ => panic!("expected check"),
        }
    }
}
