mod help_text;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Checksum snapshots of directory trees and policy-driven comparison
#[derive(Parser, Debug)]
#[command(
    name = "snapcheck",
    version,
    about,
    long_about = help_text::ROOT_LONG_ABOUT
)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', global = true, value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug). Takes precedence over RUST_LOG.
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(long, global = true, value_name = "LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
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

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture a checksum snapshot of a directory tree
    #[command(long_about = help_text::CHECKSUM_LONG_ABOUT)]
    Checksum {
        /// Directory to snapshot
        #[arg(value_name = "DIR")]
        path: PathBuf,

        /// File to write the snapshot to
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Compare two snapshots and report changes the policy cares about
    #[command(long_about = help_text::COMPARE_LONG_ABOUT)]
    Compare {
        /// YAML policy config
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Default policy for paths no rule covers (overrides the config)
        #[arg(short = 'd', long, value_name = "POLICY")]
        default_policy: Option<String>,

        /// Show old and new sha256 for each reported change
        #[arg(long)]
        diff: bool,

        /// Older snapshot
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Newer snapshot
        #[arg(value_name = "NEW")]
        new: PathBuf,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
