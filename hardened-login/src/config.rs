use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

const DEMO_CREDENTIALS_ENV: &str = "HARDENED_LOGIN_DEMO_CREDENTIALS";
const DEFAULT_SESSION_IDLE: &str = "30m";
const DEFAULT_SWEEP_INTERVAL: &str = "1m";
const MIN_SESSION_IDLE: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Parser)]
#[command(
    name = "hardened-login",
    version,
    about = "Session-gated demo login server with hardened responses"
)]
pub struct Cli {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "FILE")]
    pub auth_file: Option<PathBuf>,

    /// Idle time before a session expires, e.g. `30m` (at least one minute).
    #[arg(long, value_name = "DURATION")]
    pub session_idle: Option<String>,

    /// How often expired sessions are swept, e.g. `1m`.
    #[arg(long, value_name = "DURATION")]
    pub sweep_interval: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Demo,
    AuthFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub credentials: CredentialSource,
    pub session_idle: Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid boolean value for env var {key}: {value}")]
    InvalidEnvBool { key: String, value: String },
    #[error("invalid duration for {key}: {value}")]
    InvalidDuration { key: &'static str, value: String },
    #[error("no auth file configured and HARDENED_LOGIN_DEMO_CREDENTIALS disables the demo credentials")]
    NoCredentials,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    auth_file: Option<PathBuf>,
    session_idle: Option<String>,
    sweep_interval: Option<String>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let demo_allowed = read_env_bool(DEMO_CREDENTIALS_ENV)?.unwrap_or(true);
        Self::resolve(cli, demo_allowed)
    }

    fn resolve(cli: Cli, demo_allowed: bool) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;

        let bind = cli
            .bind
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));
        let credentials = match cli.auth_file.or(from_file.auth_file) {
            Some(path) => CredentialSource::AuthFile(path),
            None if demo_allowed => CredentialSource::Demo,
            None => return Err(ConfigError::NoCredentials),
        };
        let session_idle = parse_duration(
            "session_idle",
            cli.session_idle
                .or(from_file.session_idle)
                .as_deref()
                .unwrap_or(DEFAULT_SESSION_IDLE),
        )?
        .max(MIN_SESSION_IDLE);
        let sweep_interval = parse_duration(
            "sweep_interval",
            cli.sweep_interval
                .or(from_file.sweep_interval)
                .as_deref()
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        )?
        .max(Duration::from_secs(1));

        Ok(Self {
            bind,
            credentials,
            session_idle,
            sweep_interval,
        })
    }
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|_| ConfigError::InvalidDuration {
        key,
        value: String::from(raw),
    })
}

fn read_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_bool_value(key, &value).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn parse_bool_value(key: &str, raw: &str) -> Result<bool, ConfigError> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from(raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{parse_bool_value, AppConfig, Cli, ConfigError, CredentialSource};

    #[test]
    fn parse_bool_value_accepts_common_true_values() {
        assert_eq!(parse_bool_value("K", "true").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "1").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "YES").ok(), Some(true));
        assert_eq!(parse_bool_value("K", " on ").ok(), Some(true));
    }

    #[test]
    fn parse_bool_value_accepts_common_false_values() {
        assert_eq!(parse_bool_value("K", "false").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "0").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "NO").ok(), Some(false));
        assert_eq!(parse_bool_value("K", " off ").ok(), Some(false));
    }

    #[test]
    fn parse_bool_value_rejects_invalid_values() {
        assert!(parse_bool_value("K", "maybe").is_err());
    }

    #[test]
    fn defaults_use_demo_credentials() -> Result<()> {
        let config = AppConfig::resolve(Cli::default(), true)?;

        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.credentials, CredentialSource::Demo);
        assert_eq!(config.session_idle, Duration::from_secs(30 * 60));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn disabling_demo_without_auth_file_is_an_error() {
        let result = AppConfig::resolve(Cli::default(), false);
        assert!(matches!(result, Err(ConfigError::NoCredentials)));
    }

    #[test]
    fn cli_values_override_config_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "bind = \"127.0.0.1:9000\"\nauth_file = \"file-auth.toml\"\nsession_idle = \"5m\"\nsweep_interval = \"10s\"\n",
        )?;

        let from_file = AppConfig::resolve(
            Cli {
                config: Some(path.clone()),
                ..Cli::default()
            },
            false,
        )?;
        assert_eq!(from_file.bind, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(
            from_file.credentials,
            CredentialSource::AuthFile(PathBuf::from("file-auth.toml"))
        );
        assert_eq!(from_file.session_idle, Duration::from_secs(300));
        assert_eq!(from_file.sweep_interval, Duration::from_secs(10));

        let overridden = AppConfig::resolve(
            Cli {
                bind: Some(SocketAddr::from(([127, 0, 0, 1], 9100))),
                auth_file: Some(PathBuf::from("cli-auth.toml")),
                session_idle: Some(String::from("2h")),
                sweep_interval: None,
                config: Some(path),
            },
            false,
        )?;
        assert_eq!(overridden.bind, SocketAddr::from(([127, 0, 0, 1], 9100)));
        assert_eq!(
            overridden.credentials,
            CredentialSource::AuthFile(PathBuf::from("cli-auth.toml"))
        );
        assert_eq!(overridden.session_idle, Duration::from_secs(2 * 3600));
        assert_eq!(overridden.sweep_interval, Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let result = AppConfig::resolve(
            Cli {
                session_idle: Some(String::from("soon")),
                ..Cli::default()
            },
            true,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                key: "session_idle",
                ..
            })
        ));
    }

    #[test]
    fn sweep_interval_has_a_one_second_floor() -> Result<()> {
        let config = AppConfig::resolve(
            Cli {
                sweep_interval: Some(String::from("10ms")),
                ..Cli::default()
            },
            true,
        )?;
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn session_idle_has_a_one_minute_floor() -> Result<()> {
        let config = AppConfig::resolve(
            Cli {
                session_idle: Some(String::from("0s")),
                ..Cli::default()
            },
            true,
        )?;
        assert_eq!(config.session_idle, Duration::from_secs(60));
        Ok(())
    }
}
