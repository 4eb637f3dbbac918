mod cli;
mod compare;
mod config;
mod console;
mod credential;
mod description_file;
mod directory;
mod execute;
mod host_query;
mod plan;
mod report;
mod session;
mod transcript;

use anyhow::Context;
use cli::{Cli, LogLevel};
use config::{Config, HostSource};
use console::Console;
use directory::FileDirectory;
use execute::Outcome;
use host_query::{CommandHostQuery, FileHostQuery, HostDescriptionQuery};
use session::{SessionError, SessionOptions, SessionOutcome};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, debug, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use transcript::{Transcript, TranscriptError};

struct SyncExitCode;

impl SyncExitCode {
    /// Exit code used when at least one directory update failed.
    fn update_failed() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used when the operator's input cannot start a run.
    fn input_error() -> ExitCode {
        ExitCode::from(2)
    }

    /// Exit code used for other errors (bad config, unreadable stores, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

struct Prepared {
    config: Config,
    transcript: Result<Option<Transcript>, TranscriptError>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration decides where the transcript goes, and the transcript
    // has to exist before logging starts so it captures every event.
    let prepared = prepare(&cli);
    let transcript = match &prepared {
        Ok(Prepared {
            transcript: Ok(transcript),
            ..
        }) => transcript.clone(),
        _ => None,
    };

    init_tracing(cli.verbose, cli.log_level, transcript.as_ref());

    let prepared = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            error!("{err:#}");
            return SyncExitCode::any_error();
        }
    };

    match &prepared.transcript {
        Ok(Some(transcript)) => debug!("Transcript: {}", transcript.path().display()),
        Ok(None) => {}
        Err(err) => warn!("{err}; continuing without a transcript"),
    }

    match run(&prepared.config, transcript) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err:#}");
            SyncExitCode::any_error()
        }
    }
}

fn prepare(cli: &Cli) -> anyhow::Result<Prepared> {
    if let Some(directory) = &cli.directory {
        std::env::set_current_dir(directory)
            .with_context(|| format!("Failed to change directory to {}", directory.display()))?;
    }

    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);

    let transcript = if config.transcript {
        Transcript::create(&config.transcript_dir, chrono::Local::now()).map(Some)
    } else {
        Ok(None)
    };

    Ok(Prepared { config, transcript })
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(file) = &cli.directory_file {
        config.directory.file = file.clone();
    }
    if let Some(file) = &cli.hosts_file {
        config.hosts.file = Some(file.clone());
        config.hosts.command = None;
    }
    if let Some(dir) = &cli.transcript_dir {
        config.transcript_dir = dir.clone();
    }
    if cli.no_transcript {
        config.transcript = false;
    }
}

fn run(config: &Config, transcript: Option<Transcript>) -> anyhow::Result<ExitCode> {
    let mut directory = FileDirectory::open(&config.directory.file)?;

    let hosts: Box<dyn HostDescriptionQuery> = match config.hosts.source()? {
        HostSource::File(path) => Box::new(FileHostQuery::open(&path)?),
        HostSource::Command { command, timeout } => {
            Box::new(CommandHostQuery::new(&command, timeout)?)
        }
    };

    let mut console = Console::stdio(transcript);
    let options = SessionOptions {
        dry_run: config.dry_run,
    };

    match session::run(&mut directory, hosts.as_ref(), &mut console, &options) {
        Ok(SessionOutcome::Completed(execution)) => {
            if config.dry_run {
                info!("DRY RUN - no directory entries were modified");
            }
            let failed: Vec<&str> = execution
                .outcomes
                .iter()
                .filter(|o| o.outcome == Outcome::Failed)
                .map(|o| o.name.as_str())
                .collect();
            if !failed.is_empty() {
                error!("{} update(s) failed: {}", failed.len(), failed.join(", "));
                return Ok(SyncExitCode::update_failed());
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(SessionError::Input(err)) => {
            error!("{err}");
            Ok(SyncExitCode::input_error())
        }
        Err(err) => Err(err.into()),
    }
}

/// `--log-level` wins over `-v`, which wins over `RUST_LOG`.
fn log_filter(verbose: u8, log_level: Option<LogLevel>) -> EnvFilter {
    match (log_level, verbose) {
        (Some(level), _) => EnvFilter::new(level.as_filter()),
        (None, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        (None, 1) => EnvFilter::new("debug"),
        (None, _) => EnvFilter::new("trace"),
    }
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>, transcript: Option<&Transcript>) {
    let stderr_layer = tracing_fmt::layer()
        .event_format(LevelPrefixFormatter {
            emoji: stderr().is_terminal(),
            timestamps: false,
        })
        .with_writer(std::io::stderr);

    let transcript_layer = transcript.map(|transcript| {
        tracing_fmt::layer()
            .with_ansi(false)
            .event_format(LevelPrefixFormatter {
                emoji: false,
                timestamps: true,
            })
            .with_writer(transcript.writer())
    });

    tracing_subscriber::registry()
        .with(log_filter(verbose, log_level))
        .with(stderr_layer)
        .with(transcript_layer)
        .init();
}

struct LevelPrefixFormatter {
    emoji: bool,
    timestamps: bool,
}

impl<S, N> FormatEvent<S, N> for LevelPrefixFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.timestamps {
            write!(writer, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        }

        if self.emoji {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn cli(args: &[&str]) -> Cli {
        <Cli as Parser>::try_parse_from(std::iter::once("descsync").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn overrides_leave_config_alone_by_default() {
        let mut config = Config::default();
        apply_overrides(&mut config, &cli(&[]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn hosts_file_flag_replaces_configured_command() {
        let mut config = Config::default();
        config.hosts.command = Some(vec!["query".to_string()]);

        apply_overrides(&mut config, &cli(&["--hosts-file", "snap.toml"]));

        assert_eq!(
            config.hosts.source().unwrap(),
            HostSource::File(PathBuf::from("snap.toml"))
        );
    }

    #[test]
    fn dry_run_and_transcript_flags() {
        let mut config = Config::default();
        apply_overrides(&mut config, &cli(&["--dry-run", "--no-transcript"]));
        assert!(config.dry_run);
        assert!(!config.transcript);
    }

    #[test]
    fn config_dry_run_not_cleared_without_flag() {
        let mut config = Config {
            dry_run: true,
            ..Config::default()
        };
        apply_overrides(&mut config, &cli(&[]));
        assert!(config.dry_run);
    }
}
