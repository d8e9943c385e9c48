//! Runtime configuration read from the environment.

use std::{env, fmt::Display, str::FromStr};

use crate::db::DbConfig;

/// Development fallback for the message encryption secret.
pub const DEV_MESSAGE_KEY: &str = "dev-message-key-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub storage: StorageBackend,
    pub db: DbConfig,
    pub session_ttl_hours: i64,
    pub session_cookie_name: String,
    pub message_key: String,
    pub seed_inspirations: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let storage_default = if env::var("DATABASE_URL").is_ok() {
            "postgres"
        } else {
            "memory"
        };

        Self {
            host: try_load("HOST", "127.0.0.1"),
            port: try_load("PORT", "3001"),
            environment: try_load("ENVIRONMENT", "development"),
            storage: try_load("STORAGE_BACKEND", storage_default),
            db: DbConfig::default(),
            session_ttl_hours: try_load("SESSION_TTL_HOURS", "168"),
            session_cookie_name: try_load("SESSION_COOKIE_NAME", "sid"),
            message_key: try_load("MESSAGE_ENCRYPTION_KEY", DEV_MESSAGE_KEY),
            seed_inspirations: try_load("SEED_INSPIRATIONS", "true"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    /// In-memory configuration used by tests and local tooling.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: "development".to_string(),
            storage: StorageBackend::Memory,
            db: DbConfig::default(),
            session_ttl_hours: 168,
            session_cookie_name: "sid".to_string(),
            message_key: DEV_MESSAGE_KEY.to_string(),
            seed_inspirations: true,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        tracing::debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().unwrap_or_else(|e| {
        tracing::warn!("Invalid {key} value '{raw}': {e}; using default: {default}");
        match default.parse() {
            Ok(v) => v,
            Err(e) => panic!("default for {key} does not parse: {e}"),
        }
    })
}
