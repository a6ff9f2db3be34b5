//! # Checkout Orchestrator
//!
//! Turns a validated checkout request into a persisted order plus a
//! provider redirect URL. The order is persisted only after the provider
//! session exists, so a failed session creation leaves nothing payable
//! behind.

use crate::error::{OrderError, OrderResult};
use crate::gateway::GatewaySelector;
use crate::order::{DeliveryDetails, Order, PaymentProvider};
use crate::pricing::{price_cart, CartItemRequest};
use crate::repository::OrderRepository;
use crate::restaurant::RestaurantDirectory;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A checkout request after boundary validation of its shape.
///
/// Field-level validation (cart non-empty, delivery fields present,
/// quantities numeric) happens in [`CheckoutService::checkout`] so the
/// rules live next to the flow they protect.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub restaurant_id: String,
    pub cart_items: Vec<CartItemRequest>,
    pub delivery_details: DeliveryDetails,
    pub provider: PaymentProvider,
}

/// Successful checkout result returned to the HTTP layer
#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
    pub order_id: String,
    pub redirect_url: String,
    pub provider: PaymentProvider,
}

/// Orchestrates pricing, session creation and order persistence
pub struct CheckoutService {
    directory: Arc<RestaurantDirectory>,
    repository: Arc<dyn OrderRepository>,
    gateways: GatewaySelector,
}

impl CheckoutService {
    pub fn new(
        directory: Arc<RestaurantDirectory>,
        repository: Arc<dyn OrderRepository>,
        gateways: GatewaySelector,
    ) -> Self {
        Self {
            directory,
            repository,
            gateways,
        }
    }

    /// Configured gateway selector (used for startup diagnostics)
    pub fn gateways(&self) -> &GatewaySelector {
        &self.gateways
    }

    /// Run the checkout flow for an authenticated user.
    ///
    /// Ordering guarantee: the order is inserted only after
    /// `create_session` succeeds, so a gateway failure or timeout cannot
    /// leave an orphaned pending order, and no order ever reaches `Paid`
    /// without a verified webhook event.
    #[instrument(skip(self, request), fields(restaurant_id = %request.restaurant_id, provider = %request.provider))]
    pub async fn checkout(
        &self,
        user_id: &str,
        request: CheckoutRequest,
    ) -> OrderResult<CheckoutRedirect> {
        let restaurant = self
            .directory
            .find_by_id(&request.restaurant_id)
            .ok_or_else(|| OrderError::RestaurantNotFound {
                restaurant_id: request.restaurant_id.clone(),
            })?;

        if request.cart_items.is_empty() {
            return Err(OrderError::Validation("cart is empty".to_string()));
        }

        if let Some(field) = request.delivery_details.missing_field() {
            return Err(OrderError::Validation(format!(
                "missing delivery field: {}",
                field
            )));
        }

        let priced = price_cart(
            &request.cart_items,
            &restaurant.menu_items,
            restaurant.delivery_price,
        )?;

        let gateway = self
            .gateways
            .get(request.provider)
            .ok_or_else(|| OrderError::Configuration(format!(
                "payment provider not configured: {}",
                request.provider
            )))?;

        let mut order = Order::new(
            restaurant.id.clone(),
            user_id,
            priced.lines,
            request.delivery_details,
            priced.total,
            request.provider,
        );

        let session = gateway.create_session(&order, restaurant).await.map_err(|e| {
            warn!(order_id = %order.id, "session creation failed: {}", e);
            e
        })?;

        order.provider_reference = Some(session.provider_reference);
        order.status = session.initial_status;

        self.repository.insert(order.clone()).await?;

        info!(
            order_id = %order.id,
            total = order.total_amount,
            "checkout session created"
        );

        Ok(CheckoutRedirect {
            order_id: order.id,
            redirect_url: session.redirect_url,
            provider: request.provider,
        })
    }
}
