// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `onec-backup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "onec-backup",
    version,
    about = "Export 1C:Enterprise infobases to .dt archives via the configurator.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `onec-backup.toml` in the current working directory; built-in
    /// defaults are used if that file does not exist.
    #[arg(long, value_name = "PATH", default_value = "onec-backup.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ONEC_BACKUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the path of the configurator launcher (1cestart.exe).
    Locate,

    /// Check whether a path is a file-based infobase.
    Validate {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Dump an infobase to a .dt archive.
    Export(ExportArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct ExportArgs {
    /// Infobase directory (containing 1Cv8.1CD) or a .1CD file.
    #[arg(long, value_name = "PATH")]
    pub base: PathBuf,

    /// Destination .dt archive. Parent directories are created.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Overrides `[export].timeout`, e.g. `90m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Secret key holding the infobase login (read from `ONEC_BACKUP_<KEY>`).
    #[arg(long, value_name = "KEY")]
    pub login_key: Option<String>,

    /// Secret key holding the infobase password.
    #[arg(long, value_name = "KEY", requires = "login_key")]
    pub password_key: Option<String>,

    /// Print the (redacted) configurator command line without running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
