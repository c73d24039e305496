mod capture;
mod checksum;
mod cli;
mod compare;
mod diff;
mod dir_list;
mod policy;
mod report;
mod snapshot;

use capture::{capture_snapshot, save_snapshot};
use cli::{Cli, Command, LogLevel};
use compare::{CompareOptions, compare_snapshots};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct SnapcheckExitCode;

impl SnapcheckExitCode {
    /// Exit code used for every failure (malformed input, bad policy, I/O errors).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    // Change working directory if -C was specified
    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return SnapcheckExitCode::any_error();
    }

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Checksum { path, output } => handle_checksum(path, output),
        Command::Compare {
            config,
            default_policy,
            diff,
            old,
            new,
        } => handle_compare(
            CompareOptions {
                config,
                default_policy,
                old_snapshot: old,
                new_snapshot: new,
            },
            diff,
        ),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            SnapcheckExitCode::any_error()
        }
    }
}

fn handle_checksum(path: PathBuf, output: PathBuf) -> anyhow::Result<ExitCode> {
    let snapshot = capture_snapshot(&path)?;
    info!("Captured {} files", snapshot.len());

    save_snapshot(&snapshot, &output)?;
    info!("Wrote snapshot to {}", output.display());

    Ok(ExitCode::SUCCESS)
}

fn handle_compare(options: CompareOptions, show_digests: bool) -> anyhow::Result<ExitCode> {
    let result = compare_snapshots(&options)?;

    report::print_changes(&result.reported, show_digests);

    info!(
        "{} change(s) reported, {} suppressed by policy",
        result.reported.len(),
        result.suppressed
    );

    Ok(ExitCode::SUCCESS)
}

fn default_filter(verbose: u8, log_level: Option<LogLevel>) -> Option<&'static str> {
    match (log_level, verbose) {
        (Some(level), _) => Some(level.as_filter()),
        (None, 0) => None,
        (None, 1) => Some("info"),
        (None, _) => Some("debug"),
    }
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    // Explicit flags win over RUST_LOG, which wins over the warn default.
    let filter = match default_filter(verbose, log_level) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
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
        if self.stderr_is_terminal {
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
