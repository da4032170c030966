//! Booking service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

use crate::pool::DbConfig;

/// Key pair issued by the payment gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"***")
            .finish()
    }
}

/// Booking service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LodgingConfig {
    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// ISO currency code sent to the gateway
    pub currency: String,

    /// Absent in development; payment orders then fail as ExternalService
    pub gateway: Option<GatewayCredentials>,
}

impl Default for LodgingConfig {
    fn default() -> Self {
        LodgingConfig {
            database_path: "./lodging.db".to_string(),
            db_max_connections: 5,
            currency: "INR".to_string(),
            gateway: None,
        }
    }
}

impl LodgingConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = LodgingConfig::default();

        let config = LodgingConfig {
            database_path: lookup("LODGING_DATABASE_PATH").unwrap_or(defaults.database_path),

            db_max_connections: lookup("LODGING_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| defaults.db_max_connections.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LODGING_DB_MAX_CONNECTIONS".to_string()))?,

            currency: lookup("LODGING_CURRENCY")
                .unwrap_or(defaults.currency)
                .trim()
                .to_ascii_uppercase(),

            gateway: match (
                lookup("LODGING_GATEWAY_KEY_ID"),
                lookup("LODGING_GATEWAY_KEY_SECRET"),
            ) {
                (Some(key_id), Some(key_secret)) => Some(GatewayCredentials { key_id, key_secret }),
                (None, None) => None,
                (Some(_), None) => {
                    return Err(ConfigError::MissingRequired(
                        "LODGING_GATEWAY_KEY_SECRET".to_string(),
                    ))
                }
                (None, Some(_)) => {
                    return Err(ConfigError::MissingRequired(
                        "LODGING_GATEWAY_KEY_ID".to_string(),
                    ))
                }
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "LODGING_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if config.currency.len() != 3 || !config.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue("LODGING_CURRENCY".to_string()));
        }

        Ok(config)
    }

    /// Pool settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
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
        let config = LodgingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, "./lodging.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.currency, "INR");
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = LodgingConfig::from_lookup(lookup(&[
            ("LODGING_DATABASE_PATH", "/var/lib/lodging.db"),
            ("LODGING_DB_MAX_CONNECTIONS", "12"),
            ("LODGING_CURRENCY", "usd"),
            ("LODGING_GATEWAY_KEY_ID", "rzp_test_1"),
            ("LODGING_GATEWAY_KEY_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.currency, "USD");
        let gateway = config.gateway.unwrap();
        assert_eq!(gateway.key_id, "rzp_test_1");
        assert!(!format!("{gateway:?}").contains("s3cret"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            LodgingConfig::from_lookup(lookup(&[("LODGING_DB_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            LodgingConfig::from_lookup(lookup(&[("LODGING_CURRENCY", "RUPEES")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            LodgingConfig::from_lookup(lookup(&[("LODGING_GATEWAY_KEY_ID", "rzp_test_1")])),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
