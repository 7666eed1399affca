//! Catalog service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use catalog_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Catalog service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Attempts at a create whose order assignment hits a locked database
    pub order_retry_limit: u32,

    /// Redis connection string for snapshot publication (optional)
    pub redis_url: Option<String>,
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                     | Default        |
    /// |------------------------------|----------------|
    /// | `CATALOG_DB_PATH`            | `./catalog.db` |
    /// | `CATALOG_DB_MAX_CONNECTIONS` | `5`            |
    /// | `CATALOG_ORDER_RETRY_LIMIT`  | `3`            |
    /// | `CATALOG_REDIS_URL`          | unset          |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = CatalogConfig {
            database_path: lookup("CATALOG_DB_PATH")
                .unwrap_or_else(|| "./catalog.db".to_string())
                .into(),

            max_connections: lookup("CATALOG_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CATALOG_DB_MAX_CONNECTIONS".to_string()))?,

            order_retry_limit: lookup("CATALOG_ORDER_RETRY_LIMIT")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CATALOG_ORDER_RETRY_LIMIT".to_string()))?,

            redis_url: lookup("CATALOG_REDIS_URL").filter(|url| !url.trim().is_empty()),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("CATALOG_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("CATALOG_DB_PATH".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .order_retry_limit(self.order_retry_limit)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("{0} is set but this build has no support for it")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./catalog.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.order_retry_limit, 3);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            ("CATALOG_DB_PATH", "/var/lib/catalog/catalog.db"),
            ("CATALOG_DB_MAX_CONNECTIONS", "12"),
            ("CATALOG_ORDER_RETRY_LIMIT", "6"),
            ("CATALOG_REDIS_URL", "redis://cache:6379"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 12);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));

        let db = config.db_config();
        assert_eq!(db.max_connections, 12);
        assert_eq!(db.order_retry_limit, 6);
    }

    #[test]
    fn test_invalid_number() {
        let err = CatalogConfig::from_lookup(lookup(&[("CATALOG_ORDER_RETRY_LIMIT", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "CATALOG_ORDER_RETRY_LIMIT"));
    }

    #[test]
    fn test_zero_connections_rejected() {
        assert!(CatalogConfig::from_lookup(lookup(&[("CATALOG_DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
