//! Environment-based configuration for the Arcana API
//!
//! One config struct, loaded at startup, never reloaded.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Server host address (default: "0.0.0.0").
    pub host: String,
    /// Server port (default: 8080).
    pub port: u16,
    /// Postgres URL for reading persistence (optional; absent runs without
    /// persistence).
    pub database_url: Option<String>,
    /// Redis URL for the L2 cache (optional; absent runs L1-only).
    pub redis_url: Option<String>,
    /// Path to ephemeris data files for the optional Swiss backend.
    pub ephemeris_path: Option<String>,
    /// Cache entry TTL in seconds (default: 86400).
    pub cache_ttl_secs: u64,
    /// Default reading retention in days (default: 365).
    pub default_retention_days: u32,
    /// Hard cap for biometric retention in days (default: 30).
    pub biometric_retention_days: u32,
    /// Per-engine run deadline in seconds (default: 30).
    pub engine_deadline_secs: u64,
    /// Decoupled write deadline in seconds (default: 5).
    pub write_deadline_secs: u64,
    /// Hash of the admin API key (optional; stored as an opaque value).
    pub admin_api_key_hash: Option<String>,
    /// Log level filter (default: "info").
    pub log_level: String,
    /// Log format: "pretty" or "json" (default: "pretty").
    pub log_format: String,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl ServiceConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8080),
            database_url: env::var("DATABASE_URL").ok(),
            redis_url: env::var("REDIS_URL").ok(),
            ephemeris_path: env::var("EPHEMERIS_PATH").ok(),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", 86_400),
            default_retention_days: env_parse("DEFAULT_RETENTION_DAYS", 365),
            biometric_retention_days: env_parse("BIOMETRIC_RETENTION_DAYS", 30),
            engine_deadline_secs: env_parse("ENGINE_DEADLINE_SECS", 30),
            write_deadline_secs: env_parse("WRITE_DEADLINE_SECS", 5),
            admin_api_key_hash: env::var("ADMIN_API_KEY_HASH").ok(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }

    /// Check for configurations that cannot work.
    pub fn validate(&self) -> Result<(), String> {
        if self.engine_deadline_secs == 0 {
            return Err("ENGINE_DEADLINE_SECS cannot be 0".to_string());
        }
        if self.write_deadline_secs == 0 {
            return Err("WRITE_DEADLINE_SECS cannot be 0".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("CACHE_TTL_SECS cannot be 0".to_string());
        }
        if self.biometric_retention_days > 30 {
            return Err(format!(
                "BIOMETRIC_RETENTION_DAYS {} exceeds the 30-day category maximum",
                self.biometric_retention_days
            ));
        }
        if self.log_format != "pretty" && self.log_format != "json" {
            tracing::warn!(
                "Unknown LOG_FORMAT '{}', falling back to 'pretty'",
                self.log_format
            );
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_deadline(&self) -> Duration {
        Duration::from_secs(self.engine_deadline_secs)
    }

    pub fn write_deadline(&self) -> Duration {
        Duration::from_secs(self.write_deadline_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            redis_url: None,
            ephemeris_path: None,
            cache_ttl_secs: 86_400,
            default_retention_days: 365,
            biometric_retention_days: 30,
            engine_deadline_secs: 30,
            write_deadline_secs: 5,
            admin_api_key_hash: None,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_deadline_rejected() {
        let config = ServiceConfig {
            engine_deadline_secs: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn biometric_cap_cannot_be_raised() {
        let config = ServiceConfig {
            biometric_retention_days: 90,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bind_address_format() {
        let config = ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..ServiceConfig::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }
}
