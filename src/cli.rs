mod help_text;

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Reconcile directory computer descriptions with each host's own description
#[derive(Parser, Debug)]
#[command(name = "descsync", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything else
    #[arg(short = 'C', value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: descsync.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Simulate directory updates instead of applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Directory description store, overriding [directory] file
    #[arg(long, value_name = "FILE")]
    pub directory_file: Option<PathBuf>,

    /// Host description snapshot, overriding the [hosts] source
    #[arg(long, value_name = "FILE")]
    pub hosts_file: Option<PathBuf>,

    /// Where to write the run transcript, overriding transcript_dir
    #[arg(long, value_name = "DIR", conflicts_with = "no_transcript")]
    pub transcript_dir: Option<PathBuf>,

    /// Do not write a transcript for this run
    #[arg(long)]
    pub no_transcript: bool,

    /// Increase log verbosity (-v debug, -vv trace). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_level_and_verbose_conflict() {
        let result = Cli::try_parse_from(["descsync", "-v", "--log-level", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::try_parse_from(["descsync", "-vv", "--dry-run"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.dry_run);
        assert_eq!(cli.log_level, None);
    }
}
