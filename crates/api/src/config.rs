//! API server configuration

use shopgate_billing::{BillingConfig, BillingError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error(transparent)]
    Billing(#[from] BillingError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// App API key; session tokens must carry it as their audience
    pub shopify_api_key: String,
    /// App API secret; signs session tokens (HS256)
    pub shopify_api_secret: String,
    pub run_migrations: bool,
    pub billing: BillingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), BillingConfig::from_env()?)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        billing: BillingConfig,
    ) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) => parse_bool(v).ok_or_else(|| ConfigError::Invalid {
                key: "RUN_MIGRATIONS",
                reason: format!("expected true/false, got '{v}'"),
            })?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address: lookup("BIND_ADDRESS")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            shopify_api_key: required("SHOPIFY_API_KEY")?,
            shopify_api_secret: required("SHOPIFY_API_SECRET")?,
            run_migrations,
            billing,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
