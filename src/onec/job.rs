// src/onec/job.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{BackupError, Result};
use crate::fs::FileSystem;
use crate::onec::locator::validate_database_path;
use crate::onec::monitor::MonitorStats;
use crate::secrets::Credentials;

/// Default upper bound for one export.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// One request to dump an infobase into a `.dt` archive.
///
/// Built only through [`ExportJob::new`], which checks the database path,
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExportJob {
    database_path: PathBuf,
    output_archive_path: PathBuf,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl ExportJob {
    pub fn new(
        fs: &dyn FileSystem,
        database_path: impl Into<PathBuf>,
        output_archive_path: impl Into<PathBuf>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let database_path = database_path.into();
        if !validate_database_path(fs, &database_path) {
            return Err(BackupError::InvalidDatabasePath(database_path));
        }
        if timeout.is_zero() {
            return Err(BackupError::ConfigError(
                "export timeout must be greater than zero".to_string(),
            ));
        }

        let output_archive_path = output_archive_path.into();
        if has_log_extension(&output_archive_path) {
            return Err(BackupError::ConfigError(format!(
                "output archive {} would collide with the configurator log",
                output_archive_path.display()
            )));
        }

        Ok(Self {
            database_path,
            output_archive_path,
            credentials,
            timeout,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn output_archive_path(&self) -> &Path {
        &self.output_archive_path
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Where the configurator writes its own log (`/Out`): the archive path
    /// with its extension replaced by `log`.
    pub fn log_path(&self) -> PathBuf {
        self.output_archive_path.with_extension("log")
    }
}

fn has_log_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("log"))
}

/// Lifecycle of one supervised export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::TimedOut)
    }
}

/// Verdict of [`crate::onec::Supervisor::run`].
///
/// A failed outcome always carries a non-empty diagnostic; a successful one
/// never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub succeeded: bool,
    pub diagnostic: Option<String>,
    pub state: JobState,
    pub exit_code: Option<i32>,
    pub stats: MonitorStats,
}

impl ExportOutcome {
    pub(crate) fn success(exit_code: Option<i32>, stats: MonitorStats) -> Self {
        Self {
            succeeded: true,
            diagnostic: None,
            state: JobState::Succeeded,
            exit_code,
            stats,
        }
    }

    pub(crate) fn failure(
        diagnostic: impl Into<String>,
        exit_code: Option<i32>,
        stats: MonitorStats,
    ) -> Self {
        Self::failed_with_state(JobState::Failed, diagnostic.into(), exit_code, stats)
    }

    pub(crate) fn timed_out(timeout: Duration, stats: MonitorStats) -> Self {
        Self::failed_with_state(
            JobState::TimedOut,
            format!("export timed out after {timeout:?}"),
            None,
            stats,
        )
    }

    fn failed_with_state(
        state: JobState,
        diagnostic: String,
        exit_code: Option<i32>,
        stats: MonitorStats,
    ) -> Self {
        let diagnostic = if diagnostic.trim().is_empty() {
            crate::onec::diagnostic::NO_DESCRIPTION.to_string()
        } else {
            diagnostic
        };
        Self {
            succeeded: false,
            diagnostic: Some(diagnostic),
            state,
            exit_code,
            stats,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}
