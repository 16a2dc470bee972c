//! API configuration module.
//!
//! Layered with the `config` crate, later sources overriding earlier ones:
//!
//! ```text
//! built-in defaults
//!   └─► config/default.toml          (optional)
//!         └─► config/{BODEGA_ENV}.toml (optional, BODEGA_ENV defaults to "development")
//!               └─► BODEGA_* environment variables, "__" between nested keys
//!                   e.g. BODEGA_PORT=9000, BODEGA_AUTH__REQUIRED=true
//! ```

use bodega_core::{validation, TaxRate, DEFAULT_VAT_RATE_BPS};
use config::{Config, Environment, File};
use serde::Deserialize;

/// API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,

    /// VAT included in sale prices, in basis points (1900 = 19%)
    pub vat_rate_bps: u32,

    pub auth: AuthConfig,
}

/// Bearer token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Reject `/api` requests without a valid token
    pub required: bool,

    /// HS256 signing secret
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub access_lifetime_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "bodega.db".to_string(),
            max_connections: 5,
            log_level: "info".to_string(),
            vat_rate_bps: DEFAULT_VAT_RATE_BPS,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            required: false,
            jwt_secret: String::new(),
            access_lifetime_secs: 86_400,
        }
    }
}

impl ApiConfig {
    /// Load configuration from files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("BODEGA_ENV").unwrap_or_else(|_| "development".to_string());
        let defaults = ApiConfig::default();

        let settings = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("log_level", defaults.log_level)?
            .set_default("vat_rate_bps", i64::from(defaults.vat_rate_bps))?
            .set_default("auth.required", defaults.auth.required)?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.access_lifetime_secs", defaults.auth.access_lifetime_secs)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix("BODEGA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.required && self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.access_lifetime_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        validation::validate_tax_rate_bps(self.vat_rate_bps)
            .map_err(|_| ConfigError::InvalidValue("vat_rate_bps".to_string()))?;
        Ok(())
    }

    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.vat_rate_bps)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
