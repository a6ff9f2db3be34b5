//! # Stripe Configuration
//!
//! Explicit configuration object passed into the gateway at construction
//! time. Secrets are loaded from environment variables; tests construct
//! the config directly and point `api_base_url` at a mock server.

use order_core::OrderError;
use std::env;

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Diner-facing frontend, base for success/cancel redirects
    pub frontend_url: String,

    /// ISO 4217 currency code for sessions
    pub currency: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    /// - `FRONTEND_URL`
    pub fn from_env() -> Result<Self, OrderError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| OrderError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?;

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| OrderError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string()))?;

        let frontend_url = env::var("FRONTEND_URL")
            .map_err(|_| OrderError::Configuration("FRONTEND_URL not set".to_string()))?;

        if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
            return Err(OrderError::Configuration(
                "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        if !webhook_secret.starts_with("whsec_") {
            return Err(OrderError::Configuration(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
            ));
        }

        Ok(Self {
            secret_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            api_version: "2024-12-18.acacia".to_string(),
            frontend_url,
            currency: env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: "https://api.stripe.com".to_string(),
            api_version: "2024-12-18.acacia".to_string(),
            frontend_url: frontend_url.into(),
            currency: "usd".to_string(),
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Redirect target after successful payment
    pub fn success_url(&self) -> String {
        format!("{}/order-status?success=true", self.frontend_url)
    }

    /// Redirect target when the diner abandons checkout
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
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret", "https://eats.example.com");
        assert!(config.is_test_mode());
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn test_redirect_urls() {
        let config = StripeConfig::new("sk_test_abc", "whsec_x", "https://eats.example.com");
        assert_eq!(
            config.success_url(),
            "https://eats.example.com/order-status?success=true"
        );
        assert_eq!(
            config.cancel_url("rest-1"),
            "https://eats.example.com/detail/rest-1?cancelled=true"
        );
    }
}
