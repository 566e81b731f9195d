//! Connection settings for the account store.
//!
//! Settings come from a Java-style properties file:
//!
//! ```text
//! url=sqlite:bank.db
//! username : teller
//! password = pa$word
//! ```
//!
//! `url` is required. `username` and `password` default to empty, and
//! `max_connections` to 5. Values are taken literally. `TELLER_DB_URL`,
//! `TELLER_DB_USERNAME` and `TELLER_DB_PASSWORD` override the file.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use java_properties::PropertiesError;
use thiserror::Error;

/// Where the menu and CLI look for settings unless told otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "resources/db.properties";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: PropertiesError,
    },

    #[error("Missing configuration key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    /// Only meaningful for server databases; SQLite ignores it.
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// Settings for a SQLite database file, bypassing any properties file.
    pub fn sqlite_file(path: impl AsRef<Path>) -> Self {
        Self {
            url: format!("sqlite:{}", path.as_ref().display()),
            username: String::new(),
            password: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Read a properties file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_file(path)?.with_overrides(|key| std::env::var(key).ok());
        tracing::debug!("Loaded database configuration from {}", path.display());
        Ok(config)
    }

    /// Read a properties file as-is, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let values = java_properties::read(BufReader::new(file)).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_properties(&values)
    }

    pub fn from_properties(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| values.get(key).map(|v| v.trim().to_string());

        let url = get("url")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingKey("url"))?;

        let max_connections = match get("max_connections") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "max_connections",
                    message: format!("expected a positive integer, got '{}'", raw),
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            url: normalize_url(&url),
            username: get("username").unwrap_or_default(),
            password: values.get("password").cloned().unwrap_or_default(),
            max_connections,
        })
    }

    /// Replace values with `TELLER_DB_*` entries found through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TELLER_DB_URL").filter(|v| !v.trim().is_empty()) {
            self.url = normalize_url(url.trim());
        }
        if let Some(username) = lookup("TELLER_DB_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("TELLER_DB_PASSWORD") {
            self.password = password;
        }
        self
    }

    pub(crate) fn log_credentials_usage(&self) {
        if self.url.starts_with("sqlite:") && !(self.username.is_empty() && self.password.is_empty()) {
            tracing::debug!("Ignoring username/password: SQLite does not authenticate");
        }
    }
}

/// JDBC-style URLs (`jdbc:sqlite:bank.db`) are accepted as-is from older property files.
fn normalize_url(url: &str) -> String {
    url.strip_prefix("jdbc:").unwrap_or(url).to_string()
}
