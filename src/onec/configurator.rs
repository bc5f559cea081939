// src/onec/configurator.rs

use std::path::{Path, PathBuf};

use crate::errors::{BackupError, Result};
use crate::fs::FileSystem;
use crate::onec::locator::{CONFIGURATOR_EXE, Locator};

/// A configurator launcher known to exist and to carry the expected name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configurator {
    exe_path: PathBuf,
}

impl Configurator {
    pub fn new(fs: &dyn FileSystem, exe_path: impl Into<PathBuf>) -> Result<Self> {
        let exe_path = exe_path.into();

        if !fs.is_file(&exe_path) {
            return Err(BackupError::ConfiguratorNotFound(exe_path));
        }

        let name = exe_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !name.eq_ignore_ascii_case(CONFIGURATOR_EXE) {
            return Err(BackupError::UnexpectedExecutable(name));
        }

        Ok(Self { exe_path })
    }

    /// Use the explicit path if given, otherwise search with `locator`.
    pub fn resolve(
        fs: &dyn FileSystem,
        explicit: Option<&Path>,
        locator: &Locator,
    ) -> Result<Self> {
        match explicit {
            Some(path) => Self::new(fs, path),
            None => {
                let found = locator.locate(fs).ok_or_else(|| {
                    BackupError::ConfiguratorNotFound(PathBuf::from(CONFIGURATOR_EXE))
                })?;
                Self::new(fs, found)
            }
        }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }
}
