//! # Routes
//!
//! Axum router configuration. Webhook routes take the raw body and sit
//! outside CORS; the diner-facing API routes sit behind permissive CORS
//! plus request tracing.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - POST /api/v1/checkout - Create checkout session
/// - GET  /api/v1/orders - Authenticated user's orders, newest first
/// - POST /webhook/stripe - Stripe webhook handler
/// - POST /webhook/paymee - Paymee webhook handler
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/orders", get(handlers::get_my_orders));

    // Webhook routes must see the body byte-for-byte
    let webhook_routes = Router::new()
        .route("/stripe", post(handlers::stripe_webhook))
        .route("/paymee", post(handlers::paymee_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
