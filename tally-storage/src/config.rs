//! Backend and database configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://tally.db", "sqlite::memory:")
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout
    #[serde(with = "serde_duration", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Top-level configuration for a result backend instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Time-to-live for stored results, group manifests, and abandoned
    /// chord counters
    #[serde(with = "serde_duration", default = "default_result_expires")]
    pub result_expires: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            result_expires: default_result_expires(),
        }
    }
}

impl BackendConfig {
    /// Validate the configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.database.url.is_empty() {
            return Err(StoreError::Configuration(
                "database.url cannot be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(StoreError::Configuration(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.result_expires.is_zero() {
            return Err(StoreError::Configuration(
                "result_expires must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    "sqlite://tally.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_result_expires() -> Duration {
    // One day, matching the dispatch engine's default retention
    Duration::from_secs(24 * 60 * 60)
}

/// Serde helper module for Duration serialization as seconds
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        BackendConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_url() {
        let mut config = BackendConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_expiry() {
        let mut config = BackendConfig::default();
        config.result_expires = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let config = BackendConfig {
            result_expires: Duration::from_secs(3600),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["result_expires"], 3600);
    }
}
