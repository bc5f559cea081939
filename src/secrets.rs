// src/secrets.rs

//! Secret handling at the supervisor boundary.
//!
//! How secrets are stored at rest is not this crate's concern; the
//! supervisor only asks a [`SecretStore`] for plaintext values right before
//! building the configurator command line. Plaintext travels in a
//! [`Secret`], whose `Debug` and `Display` output is always redacted, so a
//! stray `?field` in a log event cannot leak it.

use std::collections::HashMap;
use std::fmt;

/// Placeholder printed in place of any secret value.
pub const REDACTED: &str = "***";

/// A string whose textual representation is always [`REDACTED`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the plaintext. Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Source of decrypted secrets.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Secret>;
}

/// Secrets held in memory. Mostly useful for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    values: HashMap<String, Secret>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Secret>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Secret>) -> Self {
        self.insert(key, value);
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Option<Secret> {
        self.values.get(key).cloned()
    }
}

/// Reads secrets from environment variables.
///
/// Key `db_password` with the default prefix is looked up as
/// `ONEC_BACKUP_DB_PASSWORD`. Empty values count as absent.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub const DEFAULT_PREFIX: &'static str = "ONEC_BACKUP_";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn var_name(&self, key: &str) -> String {
        let key: String = key
            .chars()
            .map(|c| match c {
                '-' | '.' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, key)
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &str) -> Option<Secret> {
        std::env::var(self.var_name(key))
            .ok()
            .filter(|v| !v.is_empty())
            .map(Secret::from)
    }
}

/// Login/password pair passed to the configurator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: Secret,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Look up credentials in a store.
    ///
    /// Returns `None` when the login is absent; a missing password becomes
    /// an empty one (the configurator then skips `/P`).
    pub fn resolve(
        store: &dyn SecretStore,
        login_key: &str,
        password_key: Option<&str>,
    ) -> Option<Self> {
        let login = store.get(login_key)?;
        let password = password_key
            .and_then(|key| store.get(key))
            .unwrap_or_default();
        Some(Self {
            login: login.expose().to_string(),
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_redacted_in_debug_and_display() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(format!("{secret}"), REDACTED);
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn resolve_requires_login_but_not_password() {
        let store = MemorySecretStore::new().with("login", "admin");
        let creds = Credentials::resolve(&store, "login", Some("password")).unwrap();
        assert_eq!(creds.login, "admin");
        assert!(creds.password.is_empty());

        let store = MemorySecretStore::new().with("password", "hunter2");
        assert!(Credentials::resolve(&store, "login", Some("password")).is_none());
    }

    #[test]
    fn env_store_maps_keys_to_prefixed_uppercase_names() {
        let store = EnvSecretStore::new();
        assert_eq!(store.var_name("db-login"), "ONEC_BACKUP_DB_LOGIN");
        assert_eq!(store.var_name("accounting.password"), "ONEC_BACKUP_ACCOUNTING_PASSWORD");
    }

    #[cfg(unix)]
    #[test]
    fn env_store_reads_existing_variables() {
        let store = EnvSecretStore::with_prefix("");
        assert!(store.get("path").is_some());
        assert!(store.get("definitely_not_set_onec_backup_var").is_none());
    }
}
