// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod onec;
pub mod secrets;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command, ExportArgs};
use crate::config::{ConfigFile, load_or_default, parse_duration};
use crate::errors::BackupError;
use crate::fs::RealFileSystem;
use crate::onec::{Configurator, ExportJob, Supervisor, validate_database_path};
use crate::secrets::{Credentials, EnvSecretStore};

/// High-level entry point used by `main.rs`.
///
/// Returns `Ok(false)` when the requested check or export did not succeed;
/// errors mean the environment (config, configurator, filesystem) is broken.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_or_default(PathBuf::from(&args.config))?;
    let fs = RealFileSystem;

    match args.command {
        Command::Locate => match cfg.locator().locate(&fs) {
            Some(path) => {
                println!("{}", path.display());
                Ok(true)
            }
            None => {
                eprintln!("1cestart.exe not found in {:?}", cfg.locator().roots());
                Ok(false)
            }
        },
        Command::Validate { path } => {
            let valid = validate_database_path(&fs, &path);
            println!(
                "{}: {}",
                path.display(),
                if valid { "valid infobase" } else { "not an infobase" }
            );
            Ok(valid)
        }
        Command::Export(export) => run_export(&cfg, export).await,
    }
}

async fn run_export(cfg: &ConfigFile, args: ExportArgs) -> Result<bool> {
    let fs = RealFileSystem;

    let configurator =
        Configurator::resolve(&fs, cfg.configurator_path.as_deref(), &cfg.locator())?;

    let timeout = match args.timeout.as_deref() {
        Some(s) => parse_duration(s)
            .map_err(|e| BackupError::ConfigError(format!("--timeout: {e}")))?,
        None => cfg.timeout,
    };

    let credentials = match args.login_key.as_deref() {
        Some(login_key) => {
            let store = EnvSecretStore::new();
            let creds = Credentials::resolve(&store, login_key, args.password_key.as_deref())
                .ok_or_else(|| {
                    BackupError::ConfigError(format!(
                        "secret '{login_key}' not set (expected {})",
                        store.var_name(login_key)
                    ))
                })?;
            Some(creds)
        }
        None => None,
    };

    let job = ExportJob::new(&fs, &args.base, &args.output, credentials, timeout)?;
    let supervisor = Supervisor::new(configurator, cfg.supervisor);

    if args.dry_run {
        println!("{}", supervisor.command_line(&job));
        return Ok(true);
    }

    let outcome = supervisor.run(&job).await?;
    if outcome.succeeded {
        info!(elapsed = ?outcome.stats.elapsed, "backup archive ready");
        println!("export succeeded: {}", job.output_archive_path().display());
    } else {
        let diagnostic = outcome.diagnostic().unwrap_or_default();
        warn!(state = ?outcome.state, exit_code = ?outcome.exit_code, "export failed");
        eprintln!("export failed: {diagnostic}");
    }
    Ok(outcome.succeeded)
}
