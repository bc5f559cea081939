// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BackupError, Result};
use crate::onec::SupervisorOptions;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BackupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timeout = nonzero_duration("[export].timeout", &raw.export.timeout)?;
        let poll_interval = nonzero_duration("[export].poll_interval", &raw.export.poll_interval)?;

        if raw.export.log_max_lines == 0 {
            return Err(BackupError::ConfigError(
                "[export].log_max_lines must be >= 1 (got 0)".to_string(),
            ));
        }

        Ok(ConfigFile {
            configurator_path: raw.configurator.path,
            search_roots: raw.configurator.search_roots,
            timeout,
            supervisor: SupervisorOptions {
                poll_interval,
                log_max_lines: raw.export.log_max_lines,
            },
        })
    }
}

fn nonzero_duration(field: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| BackupError::ConfigError(format!("{field}: {e}")))?;
    if duration.is_zero() {
        return Err(BackupError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(duration)
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn rejects_durations_that_overflow() {
        let err = parse_duration("6000000000000000h").unwrap_err();
        assert!(err.contains("too large"), "got: {err}");
        assert!(parse_duration("400000000000000000m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn overflowing_timeout_is_a_config_error() {
        let mut raw = RawConfigFile::default();
        raw.export.timeout = "6000000000000000h".to_string();
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, BackupError::ConfigError(ref m) if m.contains("[export].timeout")));
    }

    #[test]
    fn defaults_validate() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(3600));
        assert_eq!(cfg.supervisor, SupervisorOptions::default());
        assert!(cfg.configurator_path.is_none());
    }
}
