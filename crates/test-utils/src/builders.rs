#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use onec_backup::fs::RealFileSystem;
use onec_backup::onec::locator::DATABASE_MARKER;
use onec_backup::onec::{DEFAULT_TIMEOUT, ExportJob};
use onec_backup::secrets::Credentials;

/// Create a minimal file-based infobase (a directory holding the marker
/// file) under `root` and return its path.
pub fn infobase_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("create infobase dir");
    std::fs::write(dir.join(DATABASE_MARKER), b"infobase").expect("write marker file");
    dir
}

/// Builder for `ExportJob` on the real filesystem.
pub struct ExportJobBuilder {
    database: PathBuf,
    output: PathBuf,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl ExportJobBuilder {
    pub fn new(database: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            output: output.into(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn credentials(mut self, login: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(login, password));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ExportJob {
        ExportJob::new(
            &RealFileSystem,
            self.database,
            self.output,
            self.credentials,
            self.timeout,
        )
        .expect("Failed to build valid export job from builder")
    }
}
