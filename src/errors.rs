// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only *environment* problems are errors: a missing or wrong configurator
//! binary, an unparseable config, a process that cannot be spawned. A failed
//! export is reported through [`crate::onec::ExportOutcome`] instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configurator not found: {}", .0.display())]
    ConfiguratorNotFound(PathBuf),

    #[error("Expected 1cestart.exe, got: {0}")]
    UnexpectedExecutable(String),

    #[error("Invalid database path: {}", .0.display())]
    InvalidDatabasePath(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn configurator {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
