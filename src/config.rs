use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::*;

use crate::error::ConfigError;
use crate::models::TripCatalog;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_DATABASE_URL: &str = "sqlite://votes.db";
const DEFAULT_CORS_ORIGIN: &str = "*";

/**
 * Which storage engine the vote store talks to
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// File-backed (or in-memory) SQLite database
    Sqlite,
    /// Hosted PostgreSQL database
    Postgres,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub url: String,
}

impl DatabaseConfig {
    /**
     * Pick the backend from the url scheme
     */
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let backend = if url.starts_with("sqlite:") {
            Backend::Sqlite
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Backend::Postgres
        } else {
            return Err(ConfigError::UnsupportedDatabase(url.to_string()));
        };

        Ok(Self {
            backend,
            url: url.to_string(),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.backend == Backend::Sqlite && self.url.contains(":memory:")
    }
}

/**
 * Process-wide settings, read from the environment once at startup
 */
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /**
     * Credential for the administrative endpoints; they are not mounted when
     * this is unset
     */
    pub admin_password: Option<String>,
    pub trip_options_path: Option<PathBuf>,
    pub cors_origin: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /**
     * Build the config from any key lookup, which keeps tests away from the
     * real process environment
     */
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = with_default(&lookup, "DATABASE_URL", DEFAULT_DATABASE_URL);

        Ok(Self {
            host: with_default(&lookup, "HOST", DEFAULT_HOST),
            port: parse_var(&lookup, "PORT", DEFAULT_PORT)?,
            database: DatabaseConfig::parse(&database_url)?,
            admin_password: optional(&lookup, "ADMIN_PASSWORD"),
            trip_options_path: optional(&lookup, "TRIP_OPTIONS_PATH").map(PathBuf::from),
            cors_origin: with_default(&lookup, "CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /**
     * Load the trip catalog, preferring the configured file over the
     * embedded defaults
     */
    pub fn catalog(&self) -> Result<TripCatalog, ConfigError> {
        match &self.trip_options_path {
            Some(path) => {
                info!("Loading trip options from {}", path.display());
                TripCatalog::from_path(path)
            }
            None => TripCatalog::embedded(),
        }
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn with_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).unwrap_or_else(|| {
        debug!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    let value = with_default(lookup, key, default);
    value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        key,
        value,
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:5000");
        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.url, "sqlite://votes.db");
        assert_eq!(config.admin_password, None);
        assert_eq!(config.cors_origin, "*");
    }

    #[test]
    fn postgres_urls_select_the_hosted_backend() {
        let config = config_from(&[("DATABASE_URL", "postgres://vote@db/votes")]).unwrap();
        assert_eq!(config.database.backend, Backend::Postgres);
        let config = config_from(&[("DATABASE_URL", "postgresql://vote@db/votes")]).unwrap();
        assert_eq!(config.database.backend, Backend::Postgres);
    }

    #[test]
    fn unknown_database_scheme_is_an_error() {
        assert!(matches!(
            config_from(&[("DATABASE_URL", "mysql://localhost/votes")]),
            Err(ConfigError::UnsupportedDatabase(_))
        ));
    }

    #[test]
    fn bad_port_is_an_error() {
        match config_from(&[("PORT", "eighty")]) {
            Err(ConfigError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected an invalid PORT, got {:?}", other),
        }
    }

    #[test]
    fn blank_admin_password_counts_as_unset() {
        let config = config_from(&[("ADMIN_PASSWORD", "   ")]).unwrap();
        assert_eq!(config.admin_password, None);
        let config = config_from(&[("ADMIN_PASSWORD", "hunter2")]).unwrap();
        assert_eq!(config.admin_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn in_memory_sqlite_is_detected() {
        assert!(DatabaseConfig::parse("sqlite::memory:").unwrap().is_in_memory());
        assert!(!DatabaseConfig::parse("sqlite://votes.db").unwrap().is_in_memory());
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let config = config_from(&[("TRIP_OPTIONS_PATH", "/nonexistent/trips.json")]).unwrap();
        assert!(matches!(config.catalog(), Err(ConfigError::CatalogIo { .. })));
    }
}
