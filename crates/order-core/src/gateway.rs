//! # Payment Gateway Trait
//!
//! One capability, two variant implementations: a card provider (Stripe,
//! signature-authenticated webhooks) and a mobile-money provider (Paymee,
//! checksum-authenticated webhooks). The checkout orchestrator and webhook
//! reconciler only ever see this trait, so tests run against fakes.

use crate::error::OrderResult;
use crate::order::{Order, OrderStatus, PaymentProvider};
use crate::restaurant::Restaurant;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A provider-hosted payment session for one order
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// URL the diner is redirected to for payment
    pub redirect_url: String,

    /// Provider-side reference (Stripe session id, Paymee token),
    /// stored on the order and cross-checked on callback
    pub provider_reference: String,

    /// Initial order status for this provider (Stripe orders start
    /// `Placed`, Paymee orders start `Pending`)
    pub initial_status: OrderStatus,
}

/// Terminal payment outcome reported by a verified callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
}

impl PaymentOutcome {
    pub fn as_status(&self) -> OrderStatus {
        match self {
            PaymentOutcome::Paid => OrderStatus::Paid,
            PaymentOutcome::Failed => OrderStatus::Failed,
        }
    }
}

/// A verified payment event, carrying only fields from the authenticated
/// envelope. The order id always comes from provider-returned metadata or
/// the token mapping, never from unverified request fields.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub provider: PaymentProvider,

    /// Order id carried in verified metadata / token mapping
    pub order_id: String,

    pub outcome: PaymentOutcome,

    /// Provider transaction reference, when the event carries one
    pub transaction_id: Option<String>,

    /// Provider-reported total, only populated when the provider's
    /// authentication scheme actually covers the amount field
    pub authoritative_amount: Option<i64>,

    /// Session id / token for cross-checking against the stored order
    pub provider_reference: Option<String>,
}

/// Result of verifying a callback payload
#[derive(Debug, Clone)]
pub enum CallbackEvent {
    /// A verified terminal payment event to reconcile
    Payment(PaymentEvent),

    /// Authenticated but not a payment outcome we act on; acknowledged
    /// so the provider stops retrying
    Ignored { kind: String },
}

/// Capability implemented by each payment provider variant
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a provider session for an order.
    ///
    /// Implementations must embed the order id and restaurant id as opaque
    /// metadata the provider returns unmodified on callback. Failures are
    /// surfaced to the checkout caller and never retried here.
    async fn create_session(
        &self,
        order: &Order,
        restaurant: &Restaurant,
    ) -> OrderResult<PaymentSession>;

    /// Authenticate a raw callback payload and parse it into an event.
    ///
    /// `signature` carries the transport-level signature header when the
    /// provider uses one; checksum providers authenticate from fields
    /// inside the payload. Verification must complete before any state is
    /// touched, and signature schemes must see the body byte-for-byte.
    async fn verify_callback(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> OrderResult<CallbackEvent>;

    /// Provider tag (routing, logging, order records)
    fn provider(&self) -> PaymentProvider;
}

/// Type alias for a boxed gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Selector mapping provider tags to gateway variants
#[derive(Clone, Default)]
pub struct GatewaySelector {
    gateways: HashMap<PaymentProvider, BoxedPaymentGateway>,
}

impl GatewaySelector {
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
        }
    }

    /// Register a gateway variant
    pub fn register(&mut self, gateway: BoxedPaymentGateway) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    /// Register with builder pattern
    pub fn with_gateway(mut self, gateway: BoxedPaymentGateway) -> Self {
        self.register(gateway);
        self
    }

    /// Get a gateway by provider tag
    pub fn get(&self, provider: PaymentProvider) -> Option<&BoxedPaymentGateway> {
        self.gateways.get(&provider)
    }

    /// List registered providers
    pub fn providers(&self) -> Vec<PaymentProvider> {
        self.gateways.keys().copied().collect()
    }

    pub fn has_provider(&self, provider: PaymentProvider) -> bool {
        self.gateways.contains_key(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_to_status() {
        assert_eq!(PaymentOutcome::Paid.as_status(), OrderStatus::Paid);
        assert_eq!(PaymentOutcome::Failed.as_status(), OrderStatus::Failed);
    }

    #[test]
    fn test_empty_selector() {
        let selector = GatewaySelector::new();
        assert!(selector.get(PaymentProvider::Stripe).is_none());
        assert!(!selector.has_provider(PaymentProvider::Paymee));
        assert!(selector.providers().is_empty());
    }
}
