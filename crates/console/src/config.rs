//! Console configuration.
//!
//! Settings come from a TOML file (see [`default_config_path`]), then from
//! environment variables, then from command-line flags applied by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use protocol::{AuthScheme, Credentials};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Values rejected by [`Config::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),

    #[error("host must not be empty")]
    EmptyHost,

    #[error("context must be a single non-empty path segment, got {0:?}")]
    InvalidContext(String),

    #[error("unknown log level {0:?}; expected trace, debug, info, warn or error")]
    InvalidLogLevel(String),
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default servlet context.
pub const DEFAULT_CONTEXT: &str = "geoserver";

/// Default account name.
pub const DEFAULT_USER: &str = "admin";

/// Default account password.
pub const DEFAULT_PASSWORD: &str = "geoserver";

/// Main configuration structure for the console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Server connection settings.
    pub connection: ConnectionConfig,

    /// Interactive console settings.
    pub console: ConsoleConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Where and how to reach the script service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Servlet context the script service is mounted under.
    pub context: String,

    /// Account name.
    pub user: String,

    /// Account password.
    pub password: String,

    /// Header framing for the credentials.
    pub auth_scheme: AuthScheme,

    /// Connect timeout in seconds; unset leaves the networking default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

/// Interactive console settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prompt shown before the first line of a statement.
    pub prompt: String,

    /// Prompt shown before continuation lines.
    pub continuation_prompt: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,

    /// Optional file that receives log output in addition to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            context: DEFAULT_CONTEXT.to_string(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            auth_scheme: AuthScheme::Standard,
            connect_timeout_secs: None,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: ">>> ".to_string(),
            continuation_prompt: "... ".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl ConnectionConfig {
    /// Scheme, host and port of the server, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Credentials sent with every request.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.password)
    }

    /// Precomputed `Authorization` header value.
    pub fn authorization(&self) -> String {
        self.credentials().authorization(self.auth_scheme)
    }

    /// Connect timeout, if configured.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// `<config dir>/script-console/config.toml`, or a relative path when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_default();
    base.join("script-console").join("config.toml")
}

impl Config {
    /// Overlay `SCRIPT_CONSOLE_PASSWORD` and `SCRIPT_CONSOLE_LOG_LEVEL`.
    ///
    /// Unset or empty variables leave the current value alone.
    pub fn apply_env_overrides(&mut self) {
        if let Some(password) = non_empty_env("SCRIPT_CONSOLE_PASSWORD") {
            tracing::debug!("Password taken from SCRIPT_CONSOLE_PASSWORD");
            self.connection.password = password;
        }
        if let Some(level) = non_empty_env("SCRIPT_CONSOLE_LOG_LEVEL") {
            tracing::debug!("Log level {} taken from SCRIPT_CONSOLE_LOG_LEVEL", level);
            self.logging.level = level;
        }
    }

    /// Check values that would otherwise fail later at connect time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let connection = &self.connection;
        if connection.port == 0 {
            return Err(ConfigError::InvalidPort(connection.port));
        }
        if connection.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        let context = &connection.context;
        if context.is_empty() || context.contains('/') || context.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidContext(context.clone()));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Bad config file {}", path.display()))
    }

    /// Read the config file at [`default_config_path`].
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse a TOML document; absent keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Invalid TOML: {}", describe_toml_error(&e)))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Error message with the byte range it refers to, when known.
fn describe_toml_error(error: &toml::de::Error) -> String {
    match error.span() {
        Some(span) => format!("{} (bytes {}..{})", error.message(), span.start, span.end),
        None => error.message().to_string(),
    }
}
