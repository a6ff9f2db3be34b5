//! # order-api
//!
//! HTTP layer for dine-cart-rs: Axum routes for checkout, order listing
//! and the provider webhook endpoints, plus application state wiring.

pub mod handlers;
pub mod routes;
pub mod state;

// Re-exports
pub use routes::create_router;
pub use state::{AppConfig, AppState};
