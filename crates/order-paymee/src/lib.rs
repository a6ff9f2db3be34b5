//! # order-paymee
//!
//! Paymee mobile-money gateway variant for dine-cart-rs.
//!
//! Callback authenticity is a shared-secret checksum over the token and
//! payment status flag only — a weaker trust boundary than a full body
//! signature. Fields outside the checksum (amount, transaction id) are
//! accepted only after the reconciler matches the token against the
//! order's stored provider reference.

pub mod config;
pub mod gateway;

// Re-exports
pub use config::PaymeeConfig;
pub use gateway::PaymeeGateway;
