//! # Webhook Reconciler
//!
//! Applies asynchronous, untrusted provider callbacks to orders exactly
//! once. Verification runs before any repository access; the terminal
//! transition itself is a conditional update at the storage layer, so
//! concurrent deliveries for the same order cannot double-apply.

use crate::error::{OrderError, OrderResult};
use crate::gateway::{CallbackEvent, GatewaySelector, PaymentEvent};
use crate::order::{Order, PaymentProvider};
use crate::repository::{OrderRepository, PaymentTransition, TransitionOutcome};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of reconciling one callback delivery
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Terminal transition applied to the order
    Applied(Order),

    /// Order was already terminal; delivery acknowledged as a no-op
    AlreadyTerminal(Order),

    /// Verified event we do not act on (non-payment event types)
    Ignored { kind: String },
}

/// Reconciles provider callbacks against persisted orders
pub struct WebhookReconciler {
    repository: Arc<dyn OrderRepository>,
    gateways: GatewaySelector,
}

impl WebhookReconciler {
    pub fn new(repository: Arc<dyn OrderRepository>, gateways: GatewaySelector) -> Self {
        Self {
            repository,
            gateways,
        }
    }

    /// Verify and apply one callback delivery.
    ///
    /// Error mapping at the HTTP boundary: `Authentication`/`CallbackParse`
    /// reject the delivery, `OrderNotFound` is 404, `Persistence` is a
    /// retryable 500 so the provider redelivers. A duplicate terminal
    /// delivery is success, never an error.
    #[instrument(skip(self, payload, signature), fields(provider = %provider))]
    pub async fn reconcile(
        &self,
        provider: PaymentProvider,
        payload: &[u8],
        signature: Option<&str>,
    ) -> OrderResult<ReconcileOutcome> {
        let gateway = self.gateways.get(provider).ok_or_else(|| {
            OrderError::Configuration(format!("payment provider not configured: {}", provider))
        })?;

        // Authenticate before touching any state. A failure here is a
        // security-relevant event, not a routine client error.
        let event = match gateway.verify_callback(payload, signature).await {
            Ok(event) => event,
            Err(e) => {
                warn!("callback verification failed: {}", e);
                return Err(e);
            }
        };

        let event = match event {
            CallbackEvent::Payment(event) => event,
            CallbackEvent::Ignored { kind } => {
                info!(kind = %kind, "ignoring non-payment callback");
                return Ok(ReconcileOutcome::Ignored { kind });
            }
        };

        let order = self
            .repository
            .find(&event.order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound {
                order_id: event.order_id.clone(),
            })?;

        self.cross_check(&order, &event)?;

        // Conditional update: the repository re-checks terminality under
        // its own lock, so a racing delivery resolves to AlreadyTerminal.
        let outcome = self
            .repository
            .apply_payment(
                &event.order_id,
                PaymentTransition {
                    status: event.outcome.as_status(),
                    transaction_id: event.transaction_id.clone(),
                    amount_override: event.authoritative_amount,
                },
            )
            .await?;

        match outcome {
            TransitionOutcome::Applied(order) => {
                info!(
                    order_id = %order.id,
                    status = ?order.status,
                    "payment reconciled"
                );
                Ok(ReconcileOutcome::Applied(order))
            }
            TransitionOutcome::AlreadyTerminal(order) => {
                info!(order_id = %order.id, "duplicate terminal delivery, acknowledged");
                Ok(ReconcileOutcome::AlreadyTerminal(order))
            }
        }
    }

    /// Tie the verified event back to the order it claims to settle.
    ///
    /// The order must belong to the callback's provider, and when both
    /// sides carry a session reference they must agree. For the checksum
    /// provider this is the only binding between the authenticated token
    /// and the order record.
    fn cross_check(&self, order: &Order, event: &PaymentEvent) -> OrderResult<()> {
        if order.provider != event.provider {
            warn!(
                order_id = %order.id,
                order_provider = %order.provider,
                event_provider = %event.provider,
                "callback provider does not match order"
            );
            return Err(OrderError::Authentication(
                "callback provider does not match order".to_string(),
            ));
        }

        if let (Some(stored), Some(claimed)) =
            (order.provider_reference.as_deref(), event.provider_reference.as_deref())
        {
            if stored != claimed {
                warn!(order_id = %order.id, "callback reference does not match order");
                return Err(OrderError::Authentication(
                    "callback reference does not match order".to_string(),
                ));
            }
        }

        Ok(())
    }
}
