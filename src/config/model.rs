// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::onec::{Locator, SupervisorOptions};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [configurator]
/// path = "C:/Program Files/1cv8/common/1cestart.exe"
/// search_roots = ["D:/Apps"]
///
/// [export]
/// timeout = "1h"
/// poll_interval = "2s"
/// log_max_lines = 20
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub configurator: ConfiguratorSection,

    #[serde(default)]
    pub export: ExportSection,
}

/// `[configurator]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfiguratorSection {
    /// Explicit path to `1cestart.exe`. When unset the locator searches.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Installation roots to search instead of `ProgramFiles`.
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
}

/// `[export]` section. Durations use `ms`, `s`, `m` or `h` suffixes.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_log_max_lines")]
    pub log_max_lines: usize,
}

fn default_timeout() -> String {
    "1h".to_string()
}

fn default_poll_interval() -> String {
    "2s".to_string()
}

fn default_log_max_lines() -> usize {
    crate::onec::diagnostic::DEFAULT_MAX_LINES
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            log_max_lines: default_log_max_lines(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub configurator_path: Option<PathBuf>,
    pub search_roots: Vec<PathBuf>,
    pub timeout: Duration,
    pub supervisor: SupervisorOptions,
}

impl ConfigFile {
    /// Locator over the configured roots, or the environment defaults.
    pub fn locator(&self) -> Locator {
        if self.search_roots.is_empty() {
            Locator::from_env()
        } else {
            Locator::new(self.search_roots.clone())
        }
    }
}
