//! Configuration management for Sangat services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values
//!
//! Every section carries defaults so the gateway boots with an empty
//! environment; only the generative API key and the JWT secret have no
//! default, and the routes that need them fail with a configuration error.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the generative API key
pub const GENERATIVE_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Generative-language backend configuration
    #[serde(default)]
    pub generative: GenerativeConfig,

    /// Gurbani text API configuration
    #[serde(default)]
    pub gurbani: GurbaniConfig,

    /// Seva board storage configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Sign-in token configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerativeConfig {
    /// Backend provider: gemini, mock
    #[serde(default = "default_generative_provider")]
    pub provider: String,

    /// API key; absent means chat and the model catalog are unavailable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model used for chat
    #[serde(default = "default_generative_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,

    /// Number of client history turns forwarded upstream
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GurbaniConfig {
    /// API base URL
    #[serde(default = "default_gurbani_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; when absent the seva board is kept in memory
    pub url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second across the generative routes
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_body_limit() -> usize { 256 * 1024 }
fn default_generative_provider() -> String { "gemini".to_string() }
fn default_generative_model() -> String { "gemini-flash-latest".to_string() }
fn default_upstream_timeout() -> u64 { 30 }
fn default_history_window() -> usize { 10 }
fn default_gurbani_base() -> String { "https://api.gurbaninow.com/v2".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_connect_timeout() -> u64 { 10 }
fn default_jwt_expiration() -> u64 { 7 * 24 * 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "sangat".to_string() }
fn default_rate_limit() -> u32 { 5 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            provider: default_generative_provider(),
            api_key: None,
            api_base: None,
            model: default_generative_model(),
            timeout_secs: default_upstream_timeout(),
            history_window: default_history_window(),
        }
    }
}

impl GenerativeConfig {
    /// Timeout for generative backend calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GurbaniConfig {
    fn default() -> Self {
        Self {
            api_base: default_gurbani_base(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.generative.api_key = resolve_api_key(
            config.generative.api_key.take(),
            std::env::var(GENERATIVE_API_KEY_ENV).ok(),
        );
        Ok(config)
    }

    /// Timeout for Gurbani API calls
    pub fn gurbani_timeout(&self) -> Duration {
        Duration::from_secs(self.gurbani.timeout_secs)
    }
}

/// Pick the generative API key: explicit configuration wins over the
/// conventional environment variable. Blank values count as absent.
pub fn resolve_api_key(configured: Option<String>, from_env: Option<String>) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_env.filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.generative.model, "gemini-flash-latest");
        assert_eq!(config.generative.history_window, 10);
        assert_eq!(config.gurbani.api_base, "https://api.gurbaninow.com/v2");
        assert!(config.generative.api_key.is_none());
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_resolve_api_key_prefers_configured() {
        let key = resolve_api_key(Some("from-config".into()), Some("from-env".into()));
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_resolve_api_key_falls_back_to_env() {
        assert_eq!(
            resolve_api_key(None, Some("from-env".into())).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            resolve_api_key(Some("  ".into()), Some("from-env".into())).as_deref(),
            Some("from-env")
        );
        assert!(resolve_api_key(None, Some("".into())).is_none());
    }

    #[test]
    fn test_timeouts() {
        let mut config = AppConfig::default();
        assert_eq!(config.generative.timeout(), Duration::from_secs(30));
        config.generative.timeout_secs = 5;
        assert_eq!(config.generative.timeout(), Duration::from_secs(5));
        assert_eq!(config.gurbani_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = AppConfig::default();
        config.generative.api_key = Some("secret".into());
        config.auth.jwt_secret = Some("jwt".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("jwt\""));
    }
}
