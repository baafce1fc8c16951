//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STRAND_CART_PATH` - Cart file location (default: .strand/cart.json)
//! - `STRAND_PRICING_URL` - Base URL of the pricing/stock service; reconciliation
//!   is unavailable when unset
//! - `STRAND_PRICING_TOKEN` - Bearer token for the pricing service
//! - `STRAND_RECONCILE_TIMEOUT_SECS` - Reconciliation timeout (default: 5)
//! - `STRAND_CURRENCY` - Display currency, ISO 4217 (default: USD)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use strand_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_CART_PATH: &str = ".strand/cart.json";
const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Clone)]
pub struct CartConfig {
    /// Where the cart document is persisted
    pub storage_path: PathBuf,
    /// Pricing/stock service base URL
    pub pricing_url: Option<Url>,
    /// Pricing service bearer token
    pub pricing_token: Option<SecretString>,
    /// Upper bound for one reconciliation round-trip
    pub reconcile_timeout: Duration,
    /// Currency used when displaying prices
    pub currency: CurrencyCode,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("storage_path", &self.storage_path)
            .field("pricing_url", &self.pricing_url.as_ref().map(Url::as_str))
            .field(
                "pricing_token",
                &self.pricing_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("reconcile_timeout", &self.reconcile_timeout)
            .field("currency", &self.currency)
            .finish()
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_CART_PATH),
            pricing_url: None,
            pricing_token: None,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            currency: CurrencyCode::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_path = lookup("STRAND_CART_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_CART_PATH), PathBuf::from);

        let pricing_url = lookup("STRAND_PRICING_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("STRAND_PRICING_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let pricing_token = lookup("STRAND_PRICING_TOKEN").map(SecretString::from);

        let reconcile_timeout = match lookup("STRAND_RECONCILE_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
        };

        let currency = lookup("STRAND_CURRENCY")
            .map(|raw| {
                raw.parse::<CurrencyCode>().map_err(|e| {
                    ConfigError::InvalidEnvVar("STRAND_CURRENCY".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            storage_path,
            pricing_url,
            pricing_token,
            reconcile_timeout,
            currency,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("STRAND_RECONCILE_TIMEOUT_SECS".to_string(), reason)
    };
    let secs = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if secs == 0 {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.storage_path, PathBuf::from(".strand/cart.json"));
        assert!(config.pricing_url.is_none());
        assert!(config.pricing_token.is_none());
        assert_eq!(config.reconcile_timeout, Duration::from_secs(5));
        assert_eq!(config.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_all_values() {
        let config = load(&[
            ("STRAND_CART_PATH", "/tmp/cart.json"),
            ("STRAND_PRICING_URL", "https://pricing.example.com/api"),
            ("STRAND_PRICING_TOKEN", "tok_9f8e7d"),
            ("STRAND_RECONCILE_TIMEOUT_SECS", "12"),
            ("STRAND_CURRENCY", "gbp"),
        ])
        .unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(
            config.pricing_url.unwrap().as_str(),
            "https://pricing.example.com/api"
        );
        assert_eq!(config.pricing_token.unwrap().expose_secret(), "tok_9f8e7d");
        assert_eq!(config.reconcile_timeout, Duration::from_secs(12));
        assert_eq!(config.currency, CurrencyCode::GBP);
    }

    #[test]
    fn test_invalid_url() {
        let err = load(&[("STRAND_PRICING_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref name, _) if name == "STRAND_PRICING_URL"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(load(&[("STRAND_RECONCILE_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("STRAND_RECONCILE_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_unknown_currency_rejected() {
        assert!(load(&[("STRAND_CURRENCY", "XYZ")]).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[("STRAND_PRICING_TOKEN", "super_secret_pricing_token")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_pricing_token"));
    }
}
