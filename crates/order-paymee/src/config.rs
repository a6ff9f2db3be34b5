//! # Paymee Configuration
//!
//! Explicit configuration object for the Paymee gateway. The API key is
//! both the outbound credential and the shared secret folded into the
//! webhook checksum.

use order_core::OrderError;
use std::env;

/// Paymee API configuration
#[derive(Debug, Clone)]
pub struct PaymeeConfig {
    /// Shared API key (outbound auth and checksum secret)
    pub api_key: String,

    /// API base URL (sandbox or production, also mockable in tests)
    pub api_base_url: String,

    /// Diner-facing frontend, base for return/cancel redirects
    pub frontend_url: String,
}

impl PaymeeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYMEE_API_KEY`
    /// - `FRONTEND_URL`
    ///
    /// Optional:
    /// - `PAYMEE_API_BASE_URL` (defaults to the sandbox)
    pub fn from_env() -> Result<Self, OrderError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("PAYMEE_API_KEY")
            .map_err(|_| OrderError::Configuration("PAYMEE_API_KEY not set".to_string()))?;

        let frontend_url = env::var("FRONTEND_URL")
            .map_err(|_| OrderError::Configuration("FRONTEND_URL not set".to_string()))?;

        Ok(Self {
            api_key,
            api_base_url: env::var("PAYMEE_API_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.paymee.tn".to_string()),
            frontend_url,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_key: impl Into<String>, frontend_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: "https://sandbox.paymee.tn".to_string(),
            frontend_url: frontend_url.into(),
        }
    }

    /// Redirect target after the diner finishes on the Paymee page
    pub fn return_url(&self) -> String {
        format!("{}/order-status?success=true", self.frontend_url)
    }

    /// Redirect target when the diner abandons payment
    pub fn cancel_url(&self, restaurant_id: &str) -> String {
        format!("{}/detail/{}?cancelled=true", self.frontend_url, restaurant_id)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_construction() {
        let config = PaymeeConfig::new("key-123", "https://eats.example.com");
        assert_eq!(config.api_base_url, "https://sandbox.paymee.tn");
        assert_eq!(
            config.return_url(),
            "https://eats.example.com/order-status?success=true"
        );
        assert_eq!(
            config.cancel_url("rest-1"),
            "https://eats.example.com/detail/rest-1?cancelled=true"
        );
    }
}
