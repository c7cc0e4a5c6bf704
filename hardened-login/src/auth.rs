//! Credential verification for the login gate.
//!
//! The gate never compares credentials itself; it asks a [`CredentialVerifier`].
//! Two verifiers ship with the server:
//!
//! - [`FixedCredentials`]: a single literal pair, `admin` / `1234` by default.
//! - [`FileCredentials`]: users read from a TOML credentials file.
//!
//! ## Credentials file
//!
//! ```toml
//! # optional top-level user
//! username = "admin"
//! password = "secret"
//!
//! [[users]]
//! username = "alice"
//! password = "pw1"
//! ```
//!
//! Values are taken verbatim, whitespace included. Entries with an empty
//! username or password are ignored, and a repeated username keeps its last
//! password. Keep the file `chmod 600`; a world-readable file is reported at
//! startup (Unix).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "1234";

/// Decides whether a submitted username/password pair is valid.
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug {
    fn verify(&self, username: &str, password: &str) -> bool;

    /// Short label for startup logging.
    fn describe(&self) -> String;
}

fn bytes_match(submitted: &str, known: &str) -> bool {
    submitted.as_bytes().ct_eq(known.as_bytes()).into()
}

/// One fixed pair, compared exactly and case-sensitively.
#[derive(Debug, Clone)]
pub struct FixedCredentials {
    username: String,
    password: String,
}

impl FixedCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_USERNAME, DEMO_PASSWORD)
    }
}

impl CredentialVerifier for FixedCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Both halves are always compared.
        let user_ok = bytes_match(username, &self.username);
        let pass_ok = bytes_match(password, &self.password);
        user_ok & pass_ok
    }

    fn describe(&self) -> String {
        String::from("fixed demo credentials")
    }
}

#[derive(Debug, Error)]
pub enum AuthFileError {
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid credentials file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("credentials file {path} lists no usable user")]
    NoUsers { path: String },
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    username: Option<String>,
    password: Option<String>,
    #[serde(default)]
    users: Vec<UserEntry>,
}

/// Username → password map loaded from a credentials file.
#[derive(Debug, Clone, Default)]
pub struct FileCredentials {
    users: BTreeMap<String, String>,
}

impl FileCredentials {
    pub fn load(path: &Path) -> Result<Self, AuthFileError> {
        warn_if_world_readable(path);
        let raw = std::fs::read_to_string(path).map_err(|source| AuthFileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, AuthFileError> {
        let file: CredentialsFile =
            toml::from_str(raw).map_err(|source| AuthFileError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        let top_level = match (file.username, file.password) {
            (Some(username), Some(password)) => Some(UserEntry { username, password }),
            _ => None,
        };
        let credentials = top_level
            .into_iter()
            .chain(file.users)
            .fold(Self::default(), |acc, entry| {
                acc.with_user(entry.username, entry.password)
            });

        if credentials.users.is_empty() {
            return Err(AuthFileError::NoUsers {
                path: path.display().to_string(),
            });
        }
        Ok(credentials)
    }

    /// Adds or replaces a user. Empty usernames or passwords are ignored.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let (username, password) = (username.into(), password.into());
        if !username.is_empty() && !password.is_empty() {
            self.users.insert(username, password);
        }
        self
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl CredentialVerifier for FileCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|known| bytes_match(password, known))
    }

    fn describe(&self) -> String {
        format!("credentials file ({} users)", self.user_count())
    }
}

#[cfg(unix)]
fn warn_if_world_readable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let readable_by_others = std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o004 != 0)
        .unwrap_or(false);
    if readable_by_others {
        warn!(path = %path.display(), "credentials file is world-readable; consider chmod 600");
    }
}

#[cfg(not(unix))]
fn warn_if_world_readable(_path: &Path) {}
