// src/onec/command.rs

//! Configurator command-line construction.
//!
//! Arguments are kept structured (flag + value) until the last moment so
//! that the copy written to logs can redact the password while the copy
//! handed to the OS carries it.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use tokio::process::Command;

use crate::secrets::{Credentials, REDACTED, Secret};

/// Launch mode that exposes the infobase dump commands.
pub const DESIGNER_MODE: &str = "DESIGNER";

#[derive(Clone)]
enum ArgValue {
    None,
    Plain(String),
    Secret(Secret),
}

/// One configurator argument such as `/F<path>` or `DESIGNER`.
#[derive(Clone)]
pub struct ConfiguratorArg {
    flag: &'static str,
    value: ArgValue,
}

impl ConfiguratorArg {
    fn bare(flag: &'static str) -> Self {
        Self {
            flag,
            value: ArgValue::None,
        }
    }

    fn path(flag: &'static str, path: &Path) -> Self {
        Self::plain(flag, path.to_string_lossy().into_owned())
    }

    fn plain(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: ArgValue::Plain(value.into()),
        }
    }

    fn secret(flag: &'static str, value: Secret) -> Self {
        Self {
            flag,
            value: ArgValue::Secret(value),
        }
    }

    pub fn flag(&self) -> &'static str {
        self.flag
    }

    /// Argument exactly as the configurator receives it (`/N<login>`).
    pub fn to_os_string(&self) -> OsString {
        match &self.value {
            ArgValue::None => OsString::from(self.flag),
            ArgValue::Plain(v) => OsString::from(format!("{}{}", self.flag, v)),
            ArgValue::Secret(s) => OsString::from(format!("{}{}", self.flag, s.expose())),
        }
    }

    /// Windows form with the value quoted (`/F"C:\Bases\Acc"`), passed
    /// verbatim so the configurator's own parser sees the quotes.
    #[cfg_attr(not(windows), allow(dead_code))]
    fn to_quoted(&self) -> String {
        match &self.value {
            ArgValue::None => self.flag.to_string(),
            ArgValue::Plain(v) => format!("{}\"{}\"", self.flag, v),
            ArgValue::Secret(s) => format!("{}\"{}\"", self.flag, s.expose()),
        }
    }
}

impl fmt::Display for ConfiguratorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ArgValue::None => f.write_str(self.flag),
            ArgValue::Plain(v) => write!(f, "{}\"{}\"", self.flag, v),
            ArgValue::Secret(_) => write!(f, "{}{}", self.flag, REDACTED),
        }
    }
}

impl fmt::Debug for ConfiguratorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Arguments for dumping an infobase to a `.dt` archive.
///
/// `/N` is added only for a non-empty login and `/P` only for a non-empty
/// password.
pub fn export_args(
    database: &Path,
    output: &Path,
    log: &Path,
    credentials: Option<&Credentials>,
) -> Vec<ConfiguratorArg> {
    let mut args = vec![
        ConfiguratorArg::bare(DESIGNER_MODE),
        ConfiguratorArg::path("/F", database),
        ConfiguratorArg::bare("/DisableStartupMessages"),
        ConfiguratorArg::path("/DumpIB", output),
        ConfiguratorArg::path("/Out", log),
    ];

    if let Some(creds) = credentials {
        if !creds.login.is_empty() {
            args.push(ConfiguratorArg::plain("/N", creds.login.clone()));
        }
        if !creds.password.is_empty() {
            args.push(ConfiguratorArg::secret("/P", creds.password.clone()));
        }
    }

    args
}

/// Log-safe rendering of a full command line.
pub fn render_redacted(exe: &Path, args: &[ConfiguratorArg]) -> String {
    let mut line = format!("\"{}\"", exe.display());
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string());
    }
    line
}

/// Append `args` to `cmd` in the platform's native form.
pub fn apply_args(cmd: &mut Command, args: &[ConfiguratorArg]) {
    for arg in args {
        #[cfg(windows)]
        {
            cmd.raw_arg(arg.to_quoted());
        }
        #[cfg(not(windows))]
        {
            cmd.arg(arg.to_os_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(credentials: Option<&Credentials>) -> Vec<ConfiguratorArg> {
        export_args(
            Path::new("/bases/acc"),
            Path::new("/backups/acc.dt"),
            Path::new("/backups/acc.log"),
            credentials,
        )
    }

    #[test]
    fn builds_export_arguments_in_order() {
        let flags: Vec<&str> = sample(None).iter().map(|a| a.flag()).collect();
        assert_eq!(
            flags,
            vec!["DESIGNER", "/F", "/DisableStartupMessages", "/DumpIB", "/Out"]
        );

        let raw: Vec<OsString> = sample(None).iter().map(|a| a.to_os_string()).collect();
        assert_eq!(raw[1], OsString::from("/F/bases/acc"));
        assert_eq!(raw[3], OsString::from("/DumpIB/backups/acc.dt"));
    }

    #[test]
    fn credentials_append_login_and_password() {
        let creds = Credentials::new("admin", "hunter2");
        let args = sample(Some(&creds));
        assert_eq!(args.len(), 7);
        assert_eq!(args[5].to_os_string(), OsString::from("/Nadmin"));
        assert_eq!(args[6].to_os_string(), OsString::from("/Phunter2"));
    }

    #[test]
    fn empty_password_is_not_passed() {
        let creds = Credentials::new("admin", "");
        let args = sample(Some(&creds));
        assert_eq!(args.last().map(|a| a.flag()), Some("/N"));
    }

    #[test]
    fn redacted_rendering_never_contains_password() {
        let creds = Credentials::new("admin", "hunter2");
        let args = sample(Some(&creds));
        let line = render_redacted(Path::new("/pf/1cestart.exe"), &args);

        assert!(!line.contains("hunter2"));
        assert!(line.contains("/P***"));
        assert!(line.contains("/N\"admin\""));
        assert!(!format!("{args:?}").contains("hunter2"));
    }

    #[test]
    fn quoted_form_wraps_values() {
        let args = sample(None);
        assert_eq!(args[1].to_quoted(), "/F\"/bases/acc\"");
        assert_eq!(args[2].to_quoted(), "/DisableStartupMessages");
    }
}
