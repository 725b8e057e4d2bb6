//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sluice - funnel every error of a process into one channel
#[derive(Parser, Debug)]
#[command(
    name = "sluice",
    author,
    version,
    about = "Process-wide error funnel",
    long_about = "Funnels errors into a single channel and fans them out to configured sinks.\n\n\
                  Reads errors line by line from stdin, or from the stderr of a wrapped \n\
                  command, and delivers each one to the log file, email and tracing sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SLUICE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SLUICE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Funnel errors from stdin or a wrapped command
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "sluice.toml", env = "SLUICE_CONFIG")]
    pub config: PathBuf,

    /// Override the email subject from configuration
    #[arg(long, env = "SLUICE_TITLE")]
    pub title: Option<String>,

    /// Override the log file path from configuration
    #[arg(long, env = "SLUICE_LOG")]
    pub log: Option<PathBuf>,

    /// Override the per-sink backlog warning level
    #[arg(long, env = "SLUICE_BACKLOG_WARNING")]
    pub backlog_warning: Option<usize>,

    /// Do not mirror errors into the tracing log
    #[arg(long)]
    pub no_trace: bool,

    /// Route uncaught panics of this process into the funnel
    #[arg(long)]
    pub install_guard: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SLUICE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Command to run; its stderr lines are raised as errors
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sluice.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sluice.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Resolve and show mail settings (from `[notify.mail]` or the `mail` namespace)
    #[arg(long)]
    pub mail: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_trailing_command() {
        let cli = Cli::parse_from([
            "sluice",
            "run",
            "-c",
            "custom.toml",
            "--install-guard",
            "--",
            "make",
            "-j4",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("custom.toml"));
                assert!(args.install_guard);
                assert_eq!(args.command, vec!["make", "-j4"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["sluice", "run"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.command.is_empty());
                assert!(!args.no_trace);
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sluice", "-q", "-v", "info"]).is_err());
    }
}
