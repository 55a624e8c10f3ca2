//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file in the working directory is read first.

use std::env;
use std::net::SocketAddr;

use ruedas_core::{SaleTerms, TaxRate};
use serde::{Deserialize, Serialize};

/// Signing key used when `SECRET_KEY` is not set. Never use in production.
pub const DEFAULT_SECRET_KEY: &str = "clave_por_defecto_no_segura";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Database name reported by `/api/system/info`
    pub db_name: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// JWT signing key
    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Access token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Sale tax rate in basis points
    pub tax_rate_bps: u32,

    /// Days until a credit sale is due
    pub credit_term_days: i64,

    pub debug: bool,
}

impl ApiConfig {
    /// Load configuration from `.env` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            host: var("HOST", "0.0.0.0"),

            port: var("PORT", "5000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: var("DATABASE_PATH", "pos_refaccionaria.db"),

            db_name: var("DB_NAME", "POS_Refaccionaria"),

            db_max_connections: var("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            secret_key: var("SECRET_KEY", DEFAULT_SECRET_KEY),

            token_lifetime_secs: var("TOKEN_LIFETIME_SECS", "28800") // 8 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TOKEN_LIFETIME_SECS".to_string()))?,

            cors_origins: var("CORS_ORIGINS", "*")
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),

            tax_rate_bps: var("TAX_RATE_BPS", "1600")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TAX_RATE_BPS".to_string()))?,

            credit_term_days: var("CREDIT_TERM_DAYS", "30")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CREDIT_TERM_DAYS".to_string()))?,

            debug: var("DEBUG", "false")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEBUG".to_string()))?,
        };

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_PATH".to_string()));
        }
        if config.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("SECRET_KEY".to_string()));
        }
        if config.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_LIFETIME_SECS".to_string()));
        }
        if config.credit_term_days < 0 {
            return Err(ConfigError::InvalidValue("CREDIT_TERM_DAYS".to_string()));
        }
        if config.tax_rate_bps > 10_000 {
            return Err(ConfigError::InvalidValue("TAX_RATE_BPS".to_string()));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HOST".to_string()))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }

    /// Tax rate and credit term handed to every sale.
    pub fn sale_terms(&self) -> SaleTerms {
        SaleTerms {
            tax_rate: TaxRate::from_bps(self.tax_rate_bps),
            credit_term_days: self.credit_term_days,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.database_path, "pos_refaccionaria.db");
        assert_eq!(config.db_name, "POS_Refaccionaria");
        assert_eq!(config.token_lifetime_secs, 28_800);
        assert!(config.uses_default_secret());
        assert!(config.allows_any_origin());
        assert!(!config.debug);

        let terms = config.sale_terms();
        assert_eq!(terms.tax_rate.bps(), 1600);
        assert_eq!(terms.credit_term_days, 30);
        assert_eq!(config.bind_address().unwrap().port(), 5000);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("SECRET_KEY", "s3cr3t"),
            ("CORS_ORIGINS", "http://localhost:3000, http://caja.local"),
            ("TAX_RATE_BPS", "800"),
            ("CREDIT_TERM_DAYS", "15"),
            ("DEBUG", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(!config.uses_default_secret());
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000".to_string(), "http://caja.local".to_string()]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.sale_terms().tax_rate.bps(), 800);
        assert_eq!(config.sale_terms().credit_term_days, 15);
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("PORT", "cinco mil")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == "PORT"));

        let err = config_from(&[("TAX_RATE_BPS", "20000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == "TAX_RATE_BPS"));

        let err = config_from(&[("DATABASE_PATH", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
