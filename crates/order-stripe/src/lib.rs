//! # order-stripe
//!
//! Stripe gateway variant for dine-cart-rs.
//!
//! Checkout collection goes through Stripe's hosted Checkout Sessions;
//! webhook authenticity is a provider-issued HMAC-SHA256 signature over
//! the raw request body, so the body must reach `verify_callback`
//! byte-for-byte.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use order_stripe::StripeGateway;
//! use order_core::PaymentGateway;
//!
//! let gateway = StripeGateway::from_env()?;
//! let session = gateway.create_session(&order, &restaurant).await?;
//! // Redirect the diner to session.redirect_url
//! ```

pub mod config;
pub mod gateway;

// Re-exports
pub use config::StripeConfig;
pub use gateway::StripeGateway;
