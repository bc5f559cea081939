// src/onec/locator.rs

//! Finding the configurator binary and checking database paths.
//!
//! Everything here is read-only probing through [`FileSystem`]; nothing is
//! spawned.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::fs::FileSystem;

/// File name of the configurator launcher.
pub const CONFIGURATOR_EXE: &str = "1cestart.exe";

/// Marker file present in the directory of a file-based infobase.
pub const DATABASE_MARKER: &str = "1Cv8.1CD";

/// Extension of a single-file infobase container.
pub const DATABASE_EXTENSION: &str = "1cd";

const PLATFORM_DIR: &str = "1cv8";

/// Searches conventional installation roots for [`CONFIGURATOR_EXE`].
#[derive(Debug, Clone)]
pub struct Locator {
    roots: Vec<PathBuf>,
}

impl Locator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Roots taken from `ProgramFiles` and `ProgramFiles(x86)`, with the
    /// usual defaults when those are unset.
    pub fn from_env() -> Self {
        let program_files =
            std::env::var("ProgramFiles").unwrap_or_else(|_| r"C:\Program Files".to_string());
        let program_files_x86 = std::env::var("ProgramFiles(x86)")
            .unwrap_or_else(|_| r"C:\Program Files (x86)".to_string());
        Self::new(vec![
            PathBuf::from(program_files),
            PathBuf::from(program_files_x86),
        ])
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// All candidate locations, in search order.
    ///
    /// The shared `common` launchers of every root come first, then the
    /// `bin` directory of each installed platform version. Version
    /// directories are listed in whatever order the filesystem yields them.
    pub fn candidates(&self, fs: &dyn FileSystem) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .roots
            .iter()
            .map(|root| root.join(PLATFORM_DIR).join("common").join(CONFIGURATOR_EXE))
            .collect();

        for root in &self.roots {
            let platform_dir = root.join(PLATFORM_DIR);
            if !fs.is_dir(&platform_dir) {
                continue;
            }
            match fs.read_dir(&platform_dir) {
                Ok(entries) => candidates.extend(
                    entries
                        .into_iter()
                        .filter(|dir| fs.is_dir(dir))
                        .map(|dir| dir.join("bin").join(CONFIGURATOR_EXE)),
                ),
                Err(e) => {
                    debug!(dir = ?platform_dir, error = %e, "cannot list platform directory");
                }
            }
        }

        candidates
    }

    /// Return the first existing configurator binary, if any.
    pub fn locate(&self, fs: &dyn FileSystem) -> Option<PathBuf> {
        let found = self
            .candidates(fs)
            .into_iter()
            .find(|candidate| fs.is_file(candidate));

        match &found {
            Some(path) => info!(path = ?path, "found {CONFIGURATOR_EXE}"),
            None => warn!(roots = ?self.roots, "{CONFIGURATOR_EXE} not found in standard locations"),
        }
        found
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Whether `path` looks like a file-based infobase.
///
/// Valid are a directory holding [`DATABASE_MARKER`], or a file with the
/// [`DATABASE_EXTENSION`] extension (any case).
pub fn validate_database_path(fs: &dyn FileSystem, path: &Path) -> bool {
    if fs.is_dir(path) {
        return fs.is_file(&path.join(DATABASE_MARKER));
    }

    fs.is_file(path)
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DATABASE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn locator() -> Locator {
        Locator::new(vec![PathBuf::from("/pf"), PathBuf::from("/pf86")])
    }

    #[test]
    fn common_launcher_wins_over_version_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("/pf/1cv8/8.3.24.1467/bin/1cestart.exe", b"".to_vec());
        fs.add_file("/pf86/1cv8/common/1cestart.exe", b"".to_vec());

        assert_eq!(
            locator().locate(&fs),
            Some(PathBuf::from("/pf86/1cv8/common/1cestart.exe"))
        );
    }

    #[test]
    fn falls_back_to_version_bin_dirs() {
        let fs = MockFileSystem::new();
        fs.add_dir("/pf/1cv8/8.3.22.1709/bin");
        fs.add_file("/pf/1cv8/8.3.24.1467/bin/1cestart.exe", b"".to_vec());

        assert_eq!(
            locator().locate(&fs),
            Some(PathBuf::from("/pf/1cv8/8.3.24.1467/bin/1cestart.exe"))
        );
    }

    #[test]
    fn ignores_plain_files_in_platform_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("/pf/1cv8/readme.txt", b"".to_vec());

        let candidates = locator().candidates(&fs);
        assert_eq!(candidates.len(), 2);
        assert_eq!(locator().locate(&fs), None);
    }

    #[test]
    fn directory_with_marker_is_valid() {
        let fs = MockFileSystem::new();
        fs.add_file("/bases/acc/1Cv8.1CD", b"db".to_vec());
        fs.add_dir("/bases/empty");

        assert!(validate_database_path(&fs, Path::new("/bases/acc")));
        assert!(!validate_database_path(&fs, Path::new("/bases/empty")));
    }

    #[test]
    fn container_file_extension_is_case_insensitive() {
        let fs = MockFileSystem::new();
        fs.add_file("/bases/trade.1CD", b"db".to_vec());
        fs.add_file("/bases/trade.1cd", b"db".to_vec());
        fs.add_file("/bases/trade.dt", b"db".to_vec());

        assert!(validate_database_path(&fs, Path::new("/bases/trade.1CD")));
        assert!(validate_database_path(&fs, Path::new("/bases/trade.1cd")));
        assert!(!validate_database_path(&fs, Path::new("/bases/trade.dt")));
        assert!(!validate_database_path(&fs, Path::new("/bases/missing.1cd")));
    }
}
