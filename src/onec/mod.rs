// src/onec/mod.rs

//! Driving the 1C:Enterprise configurator.
//!
//! - [`locator`] finds `1cestart.exe` and checks database paths.
//! - [`configurator`] wraps a validated launcher path.
//! - [`command`] builds the `DESIGNER /DumpIB` command line.
//! - [`job`] holds the export request and its outcome.
//! - [`monitor`] tracks archive-size stability while the dump runs.
//! - [`diagnostic`] summarises the configurator log after a failure.
//! - [`supervisor`] spawns the process and ties the above together.

pub mod command;
pub mod configurator;
pub mod diagnostic;
pub mod job;
pub mod locator;
pub mod monitor;
pub mod supervisor;

pub use configurator::Configurator;
pub use job::{DEFAULT_TIMEOUT, ExportJob, ExportOutcome, JobState};
pub use locator::{Locator, validate_database_path};
pub use monitor::{MonitorStats, OutputMonitor};
pub use supervisor::{OUTPUT_NOT_PRODUCED, Supervisor, SupervisorOptions};
