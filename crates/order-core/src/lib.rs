//! # order-core
//!
//! Core types and traits for the dine-cart ordering engine.
//!
//! This crate provides:
//! - `PaymentGateway` trait and `GatewaySelector` for provider variants
//! - `Order`, `CartLine`, `DeliveryDetails` and the payment status machine
//! - `price_cart` for integer minor-unit cart pricing
//! - `OrderRepository` with an atomic conditional terminal transition
//! - `CheckoutService` (orchestrator) and `WebhookReconciler`
//! - `OrderError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use order_core::{CheckoutService, CheckoutRequest, PaymentProvider};
//!
//! let service = CheckoutService::new(directory, repository, gateways);
//! let redirect = service.checkout(user_id, request).await?;
//! // Redirect the diner to redirect.redirect_url
//! ```

pub mod checkout;
pub mod error;
pub mod gateway;
pub mod order;
pub mod pricing;
pub mod reconcile;
pub mod repository;
pub mod restaurant;

// Re-exports for convenience
pub use checkout::{CheckoutRedirect, CheckoutRequest, CheckoutService};
pub use error::{OrderError, OrderResult};
pub use gateway::{
    BoxedPaymentGateway, CallbackEvent, GatewaySelector, PaymentEvent, PaymentGateway,
    PaymentOutcome, PaymentSession,
};
pub use order::{CartLine, DeliveryDetails, Order, OrderStatus, PaymentProvider};
pub use pricing::{format_minor_units, price_cart, CartItemRequest, PricedCart};
pub use reconcile::{ReconcileOutcome, WebhookReconciler};
pub use repository::{
    InMemoryOrderRepository, OrderRepository, PaymentTransition, TransitionOutcome,
};
pub use restaurant::{MenuItem, Restaurant, RestaurantDirectory};
