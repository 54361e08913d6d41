//! API Configuration Module
//!
//! Server, CORS, storage and cache selection. Configuration is loaded from
//! environment variables with defaults suited to local development.

use inventron_core::ConfigError;
use inventron_storage::CacheConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Where items and users are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "INVENTRON_STORAGE".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

/// Which cache backend serves item lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::InvalidValue {
                field: "INVENTRON_CACHE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected 'memory' or 'redis'".to_string(),
            }),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Server and CORS configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind the listener to.
    pub bind_addr: IpAddr,

    /// Port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials (cookies) in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Persistence backend.
    pub storage: StorageBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            cors_origins: Vec::new(),
            cors_allow_credentials: true,
            cors_max_age_secs: 86400,
            request_timeout: Duration::from_secs(30),
            storage: StorageBackend::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `INVENTRON_API_BIND`: listen address (default: 0.0.0.0)
    /// - `INVENTRON_API_PORT` or `PORT`: listen port (default: 3000)
    /// - `INVENTRON_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `INVENTRON_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: true)
    /// - `INVENTRON_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `INVENTRON_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
    /// - `INVENTRON_STORAGE`: "postgres" or "memory" (default: postgres)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_origins = std::env::var("INVENTRON_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let storage = match std::env::var("INVENTRON_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage,
        };

        Ok(Self {
            bind_addr: env_parse("INVENTRON_API_BIND").unwrap_or(defaults.bind_addr),
            port: env_parse("INVENTRON_API_PORT")
                .or_else(|| env_parse("PORT"))
                .unwrap_or(defaults.port),
            cors_origins,
            cors_allow_credentials: std::env::var("INVENTRON_CORS_ALLOW_CREDENTIALS")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(defaults.cors_allow_credentials),
            cors_max_age_secs: env_parse("INVENTRON_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            request_timeout: env_parse("INVENTRON_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            storage,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Check if CORS is locked to explicit origins.
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Item cache configuration.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,

    /// Lifetime of a cached item snapshot.
    pub ttl: Duration,

    /// Redis connection URL, used when `backend` is Redis.
    pub redis_url: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            ttl: inventron_storage::DEFAULT_ENTRY_TTL,
            redis_url: "redis://127.0.0.1:6379/1".to_string(),
        }
    }
}

impl CacheSettings {
    /// Create CacheSettings from environment variables.
    ///
    /// - `INVENTRON_CACHE_BACKEND`: "memory" or "redis" (default: memory)
    /// - `INVENTRON_CACHE_TTL_SECS`: entry lifetime (default: 900)
    /// - `INVENTRON_REDIS_URL`: Redis URL (default: redis://127.0.0.1:6379/1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let backend = match std::env::var("INVENTRON_CACHE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self {
            backend,
            ttl: env_parse("INVENTRON_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            redis_url: std::env::var("INVENTRON_REDIS_URL").unwrap_or(defaults.redis_url),
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().with_ttl(self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(config.cors_allow_credentials);
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://inventron.example".to_string()];
        assert!(config.is_production());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().ok(), Some(StorageBackend::Memory));
        assert_eq!("Postgres".parse::<StorageBackend>().ok(), Some(StorageBackend::Postgres));
        assert!("sqlite".parse::<StorageBackend>().is_err());

        assert_eq!("redis".parse::<CacheBackendKind>().ok(), Some(CacheBackendKind::Redis));
        assert!("memcached".parse::<CacheBackendKind>().is_err());
    }

    #[test]
    fn test_cache_defaults() {
        let settings = CacheSettings::default();
        assert_eq!(settings.backend, CacheBackendKind::Memory);
        assert_eq!(settings.ttl, Duration::from_secs(900));
        assert_eq!(settings.cache_config().entry_ttl, Duration::from_secs(900));
    }
}
