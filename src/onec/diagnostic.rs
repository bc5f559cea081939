// src/onec/diagnostic.rs

//! Turning the configurator's `/Out` log into a failure message.
//!
//! [`extract`] is total: every path through it yields a non-empty string,
//! and a read failure becomes part of the message rather than an error.

use std::path::Path;

use crate::fs::FileSystem;

pub const DEFAULT_MAX_LINES: usize = 20;
pub const MAX_DIAGNOSTIC_CHARS: usize = 1000;
pub const ELLIPSIS: &str = "...";

pub const LOG_NOT_FOUND: &str = "configurator log file not found";
pub const NO_DESCRIPTION: &str = "configurator failed without a description in its log";

const BOM: char = '\u{feff}';

/// Summarise the tail of the configurator log at `log_path`.
pub fn extract(fs: &dyn FileSystem, log_path: &Path, max_lines: usize) -> String {
    if !fs.exists(log_path) {
        return LOG_NOT_FOUND.to_string();
    }

    match fs.read(log_path) {
        Ok(bytes) => summarize(&String::from_utf8_lossy(&bytes), max_lines),
        Err(e) => format!("failed to read configurator log: {e:#}"),
    }
}

/// Last `max_lines` lines of `text`, trimmed and bounded to
/// [`MAX_DIAGNOSTIC_CHARS`] characters.
pub fn summarize(text: &str, max_lines: usize) -> String {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    let tail = lines[start..].join("\n");
    let tail = tail.trim();

    if tail.is_empty() {
        return NO_DESCRIPTION.to_string();
    }

    truncate_chars(tail, MAX_DIAGNOSTIC_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
