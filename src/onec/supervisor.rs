// src/onec/supervisor.rs

//! Export job supervisor.
//!
//! Runs the configurator for one [`ExportJob`] and decides the verdict.
//! The configurator has no reliable completion signal besides exiting, so
//! the supervisor polls: on every tick it checks the timeout first, then
//! whether the process exited, then samples the archive size for the
//! stability counter. A dump can take hours, hence the hard timeout.
//!
//! Errors returned from [`Supervisor::run`] mean the environment is broken
//! (binary cannot start, filesystem unreadable). Everything the export
//! itself can get wrong is an [`ExportOutcome`] with a diagnostic.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::errors::{BackupError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::onec::command::{ConfiguratorArg, apply_args, export_args, render_redacted};
use crate::onec::configurator::Configurator;
use crate::onec::diagnostic::{self, DEFAULT_MAX_LINES};
use crate::onec::job::{ExportJob, ExportOutcome, JobState};
use crate::onec::monitor::{MonitorStats, OutputMonitor};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const OUTPUT_NOT_PRODUCED: &str = "output archive was not created or is empty";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    pub poll_interval: Duration,
    /// Lines of the configurator log kept in a failure diagnostic.
    pub log_max_lines: usize,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_max_lines: DEFAULT_MAX_LINES,
        }
    }
}

/// Drives configurator exports. Holds no per-job state, so one instance can
/// serve concurrent `run` calls for different jobs.
#[derive(Debug, Clone)]
pub struct Supervisor {
    configurator: Configurator,
    options: SupervisorOptions,
    fs: Arc<dyn FileSystem>,
}

impl Supervisor {
    pub fn new(configurator: Configurator, options: SupervisorOptions) -> Self {
        Self::with_fs(configurator, options, Arc::new(RealFileSystem))
    }

    pub fn with_fs(
        configurator: Configurator,
        options: SupervisorOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            configurator,
            options,
            fs,
        }
    }

    /// Log-safe command line for `job` (password redacted).
    pub fn command_line(&self, job: &ExportJob) -> String {
        render_redacted(self.configurator.exe_path(), &self.args_for(job))
    }

    fn args_for(&self, job: &ExportJob) -> Vec<ConfiguratorArg> {
        export_args(
            job.database_path(),
            job.output_archive_path(),
            &job.log_path(),
            job.credentials(),
        )
    }

    /// Run one export to a terminal state.
    ///
    /// Does not return before the configurator has exited or been killed.
    pub async fn run(&self, job: &ExportJob) -> Result<ExportOutcome> {
        let output = job.output_archive_path();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }

        let args = self.args_for(job);
        info!(
            database = %job.database_path().display(),
            output = %output.display(),
            timeout = ?job.timeout(),
            "starting configurator export"
        );
        debug!(
            argc = args.len(),
            cmd = %render_redacted(self.configurator.exe_path(), &args),
            "configurator command line"
        );

        let mut handle = ProcessHandle::spawn(self.configurator.exe_path(), &args)?;

        let status = loop {
            if handle.elapsed() > job.timeout() {
                handle.terminate().await;
                handle.transition(JobState::TimedOut);
                let outcome = ExportOutcome::timed_out(job.timeout(), handle.stats());
                error!(
                    database = %job.database_path().display(),
                    timeout = ?job.timeout(),
                    "configurator export timed out"
                );
                return Ok(outcome);
            }

            if let Some(status) = handle.try_wait()? {
                break status;
            }

            let size = self.fs.file_len(output)?;
            handle.monitor.observe(size);
            trace!(
                size = ?size,
                stable_observations = handle.monitor.stable_count(),
                "sampled output archive"
            );

            tokio::time::sleep(self.options.poll_interval).await;
        };

        let outcome = self.evaluate(job, status, handle.stats())?;
        handle.transition(outcome.state);
        Ok(outcome)
    }

    fn evaluate(
        &self,
        job: &ExportJob,
        status: ExitStatus,
        stats: MonitorStats,
    ) -> Result<ExportOutcome> {
        let exit_code = status.code();
        let log_path = job.log_path();

        if !status.success() {
            let text = diagnostic::extract(&*self.fs, &log_path, self.options.log_max_lines);
            error!(
                database = %job.database_path().display(),
                exit_code = ?exit_code,
                log = %log_path.display(),
                "configurator exited with failure"
            );
            return Ok(ExportOutcome::failure(text, exit_code, stats));
        }

        let size = self.fs.file_len(job.output_archive_path())?;
        if !matches!(size, Some(n) if n > 0) {
            error!(
                output = %job.output_archive_path().display(),
                "{OUTPUT_NOT_PRODUCED}"
            );
            return Ok(ExportOutcome::failure(OUTPUT_NOT_PRODUCED, exit_code, stats));
        }

        info!(
            output = %job.output_archive_path().display(),
            size = ?size,
            elapsed = ?stats.elapsed,
            stable_observations = stats.stable_observations,
            "configurator export finished"
        );
        self.remove_log(&log_path);
        Ok(ExportOutcome::success(exit_code, stats))
    }

    /// Best effort; a leftover log is harmless.
    fn remove_log(&self, log_path: &Path) {
        if !self.fs.exists(log_path) {
            return;
        }
        if let Err(e) = self.fs.remove_file(log_path) {
            debug!(log = %log_path.display(), error = %e, "could not remove configurator log");
        }
    }
}

/// The running configurator plus its monitoring state.
///
/// The child is spawned with `kill_on_drop`, so any early return from
/// [`Supervisor::run`] still terminates it.
struct ProcessHandle {
    child: Child,
    started: Instant,
    monitor: OutputMonitor,
    state: JobState,
}

impl ProcessHandle {
    fn spawn(exe: &Path, args: &[ConfiguratorArg]) -> Result<Self> {
        let mut cmd = Command::new(exe);
        apply_args(&mut cmd, args);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|source| BackupError::Spawn {
            path: exe.to_path_buf(),
            source,
        })?;

        drain_output(child.stdout.take(), "stdout");
        drain_output(child.stderr.take(), "stderr");

        let mut handle = Self {
            child,
            started: Instant::now(),
            monitor: OutputMonitor::new(),
            state: JobState::NotStarted,
        };
        handle.transition(JobState::Running);
        Ok(handle)
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Kill the child and reap it.
    async fn terminate(&mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(pid = ?self.child.id(), error = %e, "failed to kill configurator process");
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(!self.state.is_terminal(), "export already finished");
        debug!(from = ?self.state, to = ?next, pid = ?self.child.id(), "export state change");
        self.state = next;
    }

    fn stats(&self) -> MonitorStats {
        self.monitor.stats(self.elapsed())
    }
}

/// Keep the pipe drained so a chatty configurator never blocks on a full
/// buffer. Output is not guaranteed to be UTF-8.
fn drain_output<R>(reader: Option<R>, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => debug!(stream, "configurator: {}", String::from_utf8_lossy(&buf).trim_end()),
                Err(e) => {
                    debug!(stream, error = %e, "stopped reading configurator output");
                    break;
                }
            }
        }
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::onec::diagnostic::LOG_NOT_FOUND;
    use std::os::unix::process::ExitStatusExt;

    fn fixture() -> (Arc<MockFileSystem>, Supervisor, ExportJob) {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/pf/1cv8/common/1cestart.exe", b"".to_vec());
        fs.add_file("/bases/acc/1Cv8.1CD", b"db".to_vec());

        let configurator = Configurator::new(&*fs, "/pf/1cv8/common/1cestart.exe").unwrap();
        let supervisor = Supervisor::with_fs(configurator, SupervisorOptions::default(), fs.clone());
        let job = ExportJob::new(
            &*fs,
            "/bases/acc",
            "/backups/acc.dt",
            None,
            Duration::from_secs(60),
        )
        .unwrap();
        (fs, supervisor, job)
    }

    // Raw wait statuses: exit code N is encoded as N << 8.
    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn clean_exit_with_archive_succeeds_and_removes_log() {
        let (fs, supervisor, job) = fixture();
        fs.add_file("/backups/acc.dt", vec![1u8; 128]);
        fs.add_file("/backups/acc.log", b"done".to_vec());

        let outcome = supervisor
            .evaluate(&job, exited(0), MonitorStats::default())
            .unwrap();

        assert!(outcome.succeeded);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(!fs.exists(Path::new("/backups/acc.log")));
    }

    #[test]
    fn failure_diagnostic_comes_from_extractor() {
        let (fs, supervisor, job) = fixture();
        fs.add_file("/backups/acc.log", "\u{feff}Infobase is locked\n".as_bytes().to_vec());

        let outcome = supervisor
            .evaluate(&job, exited(1), MonitorStats::default())
            .unwrap();

        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(outcome.diagnostic(), Some("Infobase is locked"));
        assert!(fs.exists(Path::new("/backups/acc.log")));
    }

    #[test]
    fn failure_without_log_reports_missing_log() {
        let (_fs, supervisor, job) = fixture();
        let outcome = supervisor
            .evaluate(&job, exited(2), MonitorStats::default())
            .unwrap();
        assert_eq!(outcome.diagnostic(), Some(LOG_NOT_FOUND));
    }

    #[test]
    fn killed_by_signal_counts_as_failure() {
        let (_fs, supervisor, job) = fixture();
        let outcome = supervisor
            .evaluate(&job, ExitStatus::from_raw(9), MonitorStats::default())
            .unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code, None);
    }

    #[test]
    fn clean_exit_with_empty_archive_fails() {
        let (fs, supervisor, job) = fixture();
        fs.add_file("/backups/acc.dt", Vec::new());
        fs.add_file("/backups/acc.log", b"started".to_vec());

        let outcome = supervisor
            .evaluate(&job, exited(0), MonitorStats::default())
            .unwrap();

        assert_eq!(outcome.diagnostic(), Some(OUTPUT_NOT_PRODUCED));
        assert!(fs.exists(Path::new("/backups/acc.log")));
    }

    #[test]
    fn command_line_is_redacted() {
        let (fs, supervisor, _) = fixture();
        let job = ExportJob::new(
            &*fs,
            "/bases/acc",
            "/backups/acc.dt",
            Some(crate::secrets::Credentials::new("admin", "hunter2")),
            Duration::from_secs(60),
        )
        .unwrap();

        let line = supervisor.command_line(&job);
        assert!(line.starts_with("\"/pf/1cv8/common/1cestart.exe\" DESIGNER /F\"/bases/acc\""));
        assert!(line.ends_with("/N\"admin\" /P***"));
    }
}
