use std::time::Duration;

use crate::store::{Connector, InMemoryConnector, PostgresConnector};

// ============================================================================
// Application Configuration
// ============================================================================
//
// Everything comes from the environment with documented defaults:
//
//   DATABASE_URL             postgres://localhost:5432/postgres  (memory:// for in-process)
//   DATABASE_NAME            vibe_db
//   FRONTEND_URL             *
//   HOST                     0.0.0.0
//   PORT                     8000
//   DB_MAX_CONNECTIONS       5
//   DB_CONNECT_TIMEOUT_SECS  5
//
// ============================================================================

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/postgres";
pub const DEFAULT_DATABASE_NAME: &str = "vibe_db";
const MEMORY_SCHEME: &str = "memory://";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub frontend_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            frontend_url: "*".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_max_connections: 5,
            db_connect_timeout: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or blank variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_name: var("DATABASE_NAME").unwrap_or(defaults.database_name),
            frontend_url: var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_number("PORT", var("PORT"), defaults.port)?,
            db_max_connections: parse_number("DB_MAX_CONNECTIONS", var("DB_MAX_CONNECTIONS"), defaults.db_max_connections)?,
            db_connect_timeout: Duration::from_secs(parse_number(
                "DB_CONNECT_TIMEOUT_SECS",
                var("DB_CONNECT_TIMEOUT_SECS"),
                defaults.db_connect_timeout.as_secs(),
            )?),
        })
    }

    pub fn uses_memory_backend(&self) -> bool {
        self.database_url.starts_with(MEMORY_SCHEME)
    }

    /// Connector for the configured backing store. Nothing connects until first use.
    pub fn connector(&self) -> Box<dyn Connector> {
        if self.uses_memory_backend() {
            Box::new(InMemoryConnector)
        } else {
            Box::new(
                PostgresConnector::new(&self.database_url, &self.database_name, self.db_max_connections)
                    .with_acquire_timeout(self.db_connect_timeout),
            )
        }
    }
}

fn parse_number<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}
