use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MedSet";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address for the REST API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

pub const ENV_BIND: &str = "MEDSET_BIND";
pub const ENV_DB_PATH: &str = "MEDSET_DB_PATH";
pub const ENV_API_TOKENS: &str = "MEDSET_API_TOKENS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,
    #[error("Invalid {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Get the application data directory
/// ~/MedSet/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Default location of the medication database
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("medset.db"))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,medset=debug"
    } else {
        "info"
    }
}

/// Runtime settings for the `medset` server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// Raw `owner=token` list used to seed the token registry.
    pub api_tokens: String,
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, so tests need not touch the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidVar {
                var: ENV_BIND,
                reason: format!("{bind_raw:?}: {e}"),
            })?;

        let database_path = match lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        Ok(Self {
            bind_addr,
            database_path,
            api_tokens: lookup(ENV_API_TOKENS).unwrap_or_default(),
        })
    }
}
