//! # Order Error Types
//!
//! Typed error handling for the dine-cart ordering engine.
//! All checkout and reconciliation operations return `Result<T, OrderError>`.

use thiserror::Error;

/// Core error type for checkout and webhook reconciliation
#[derive(Debug, Error)]
pub enum OrderError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed request data (empty cart, missing delivery fields,
    /// non-numeric quantity)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Restaurant id did not resolve
    #[error("Restaurant not found: {restaurant_id}")]
    RestaurantNotFound { restaurant_id: String },

    /// Order id did not resolve
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Webhook signature or checksum verification failed
    #[error("Callback authentication failed: {0}")]
    Authentication(String),

    /// Webhook payload could not be parsed after verification
    #[error("Callback parse error: {0}")]
    CallbackParse(String),

    /// Payment provider API error
    #[error("Gateway error [{provider}]: {message}")]
    Gateway { provider: String, message: String },

    /// Network/HTTP error communicating with a provider
    #[error("Network error: {0}")]
    Network(String),

    /// Transient persistence failure; safe for the caller to retry
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderError {
    /// Returns true if the caller (or a webhook provider) may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::Network(_) | OrderError::Gateway { .. } | OrderError::Persistence(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            OrderError::Configuration(_) => 500,
            OrderError::Validation(_) => 400,
            OrderError::RestaurantNotFound { .. } => 404,
            OrderError::OrderNotFound { .. } => 404,
            OrderError::Authentication(_) => 401,
            OrderError::CallbackParse(_) => 400,
            OrderError::Gateway { .. } => 502,
            OrderError::Network(_) => 503,
            OrderError::Persistence(_) => 500,
            OrderError::Serialization(_) => 500,
            OrderError::Internal(_) => 500,
        }
    }
}

/// Result type alias for ordering operations
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(OrderError::Network("timeout".into()).is_retryable());
        assert!(OrderError::Persistence("lock poisoned".into()).is_retryable());
        assert!(OrderError::Gateway {
            provider: "stripe".into(),
            message: "503".into()
        }
        .is_retryable());
        assert!(!OrderError::Validation("bad quantity".into()).is_retryable());
        assert!(!OrderError::Authentication("checksum mismatch".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OrderError::Validation("test".into()).status_code(), 400);
        assert_eq!(
            OrderError::OrderNotFound {
                order_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            OrderError::Authentication("bad sig".into()).status_code(),
            401
        );
        assert_eq!(
            OrderError::Persistence("transient".into()).status_code(),
            500
        );
    }
}
