//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use tower_cookies::Key;
use tracing::{info, warn};

/// Shortest accepted `SESSION_SECRET`, in bytes.
pub const MIN_SECRET_LEN: usize = 64;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("SESSION_SECRET must be at least {min} bytes, got {0}", min = MIN_SECRET_LEN)]
    ShortSecret(usize),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,

    /// SQLite connection URL.
    pub database_url: String,

    /// Maps API key for the index page.
    pub api_key: Option<String>,

    /// Cookie signing secret. A random key is used when absent, so
    /// sessions do not survive a restart.
    pub session_secret: Option<String>,

    /// Directory served under `/static`.
    pub static_dir: PathBuf,

    /// Send no-cache headers on every response.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "sqlite://radio.db".to_string(),
            api_key: None,
            session_secret: None,
            static_dir: PathBuf::from("static"),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = var("RADIO_BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    name: "RADIO_BIND_ADDR",
                    value: addr.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(url) = var("DATABASE_URL") {
            config.database_url = url;
        }

        config.api_key = var("API_KEY");
        if config.api_key.is_none() {
            warn!("API_KEY not set; the map page will not load");
        }

        if let Some(secret) = var("SESSION_SECRET") {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::ShortSecret(secret.len()));
            }
            config.session_secret = Some(secret);
        } else {
            info!("SESSION_SECRET not set, using a random session key");
        }

        if let Some(dir) = var("RADIO_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        if let Some(flag) = var("RADIO_DEBUG") {
            config.debug = parse_flag("RADIO_DEBUG", &flag)?;
        }

        Ok(config)
    }

    /// Cookie signing key.
    pub fn session_key(&self) -> Result<Key, ConfigError> {
        match &self.session_secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|_| ConfigError::ShortSecret(secret.len())),
            None => Ok(Key::generate()),
        }
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
