//! # Request Handlers
//!
//! Axum request handlers for checkout, order listing and the two provider
//! webhook endpoints. Webhook bodies are taken as raw `Bytes` and handed
//! to verification untouched; parsing them here first would break the
//! signature scheme.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use order_core::{
    CartItemRequest, CheckoutRequest, DeliveryDetails, Order, OrderError, PaymentProvider,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Checkout request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub restaurant_id: String,
    #[serde(default)]
    pub cart_items: Vec<CartItemRequest>,
    pub delivery_details: DeliveryDetailsRequest,
    /// Payment provider tag; defaults to the card provider
    #[serde(default = "default_provider")]
    pub payment_provider: PaymentProvider,
}

fn default_provider() -> PaymentProvider {
    PaymentProvider::Stripe
}

/// Delivery details as they arrive on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetailsRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
}

impl From<DeliveryDetailsRequest> for DeliveryDetails {
    fn from(req: DeliveryDetailsRequest) -> Self {
        DeliveryDetails {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            address_line1: req.address_line1,
            city: req.city,
            phone: req.phone,
        }
    }
}

/// Checkout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub order_id: String,
    /// Provider-hosted payment page to redirect the diner to
    pub redirect_url: String,
    pub payment_provider: PaymentProvider,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn order_error_to_response(err: OrderError) -> ErrorReply {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Authenticated user id, supplied by the upstream auth layer.
/// Authentication itself is out of scope here; a missing header means the
/// request never passed through that layer.
fn user_id_from_headers(headers: &HeaderMap) -> Result<String, ErrorReply> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("missing authenticated user", 401)),
            )
        })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dine-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a checkout session and return the provider redirect URL
#[instrument(skip(state, headers, request), fields(restaurant_id = %request.restaurant_id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>, ErrorReply> {
    let user_id = user_id_from_headers(&headers)?;

    let checkout_request = CheckoutRequest {
        restaurant_id: request.restaurant_id,
        cart_items: request.cart_items,
        delivery_details: request.delivery_details.into(),
        provider: request.payment_provider,
    };

    let redirect = state
        .checkout
        .checkout(&user_id, checkout_request)
        .await
        .map_err(|e| {
            error!("checkout failed: {}", e);
            order_error_to_response(e)
        })?;

    Ok(Json(CheckoutSessionResponse {
        order_id: redirect.order_id,
        redirect_url: redirect.redirect_url,
        payment_provider: redirect.provider,
    }))
}

/// List the authenticated user's orders, newest first
#[instrument(skip(state, headers))]
pub async fn get_my_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, ErrorReply> {
    let user_id = user_id_from_headers(&headers)?;

    let orders = state
        .orders
        .find_by_user(&user_id)
        .await
        .map_err(order_error_to_response)?;

    Ok(Json(orders))
}

/// Handle a Stripe webhook delivery
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ErrorReply> {
    let signature = headers.get("stripe-signature").and_then(|v| v.to_str().ok());

    reconcile_webhook(&state, PaymentProvider::Stripe, &body, signature).await
}

/// Handle a Paymee webhook delivery (checksum lives inside the payload)
#[instrument(skip(state, body))]
pub async fn paymee_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ErrorReply> {
    reconcile_webhook(&state, PaymentProvider::Paymee, &body, None).await
}

async fn reconcile_webhook(
    state: &AppState,
    provider: PaymentProvider,
    body: &[u8],
    signature: Option<&str>,
) -> Result<StatusCode, ErrorReply> {
    let outcome = state
        .reconciler
        .reconcile(provider, body, signature)
        .await
        .map_err(|e| {
            error!(provider = %provider, "webhook rejected: {}", e);
            order_error_to_response(e)
        })?;

    info!(provider = %provider, outcome = ?outcome_kind(&outcome), "webhook acknowledged");

    // Applied, duplicate-terminal and ignored deliveries all acknowledge
    // with 200 so the provider stops retrying.
    Ok(StatusCode::OK)
}

fn outcome_kind(outcome: &order_core::ReconcileOutcome) -> &'static str {
    match outcome {
        order_core::ReconcileOutcome::Applied(_) => "applied",
        order_core::ReconcileOutcome::AlreadyTerminal(_) => "already_terminal",
        order_core::ReconcileOutcome::Ignored { .. } => "ignored",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_mapping() {
        let (status, Json(body)) =
            order_error_to_response(OrderError::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);

        let (status, _) = order_error_to_response(OrderError::OrderNotFound {
            order_id: "x".into(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            order_error_to_response(OrderError::Authentication("forged".into()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            order_error_to_response(OrderError::Persistence("transient".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_user_id_extraction() {
        let mut headers = HeaderMap::new();
        assert!(user_id_from_headers(&headers).is_err());

        headers.insert("x-user-id", "user-1".parse().unwrap());
        assert_eq!(user_id_from_headers(&headers).unwrap(), "user-1");
    }

    #[test]
    fn test_checkout_request_shape() {
        let json = serde_json::json!({
            "restaurantId": "rest-1",
            "cartItems": [
                { "menuItemId": "item-a", "name": "Couscous", "quantity": "2" }
            ],
            "deliveryDetails": {
                "firstName": "Amine",
                "lastName": "Ben Salah",
                "email": "amine@example.com",
                "addressLine1": "12 Rue de Marseille",
                "city": "Tunis",
                "phone": "21612345"
            }
        });

        let request: CheckoutSessionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.restaurant_id, "rest-1");
        assert_eq!(request.cart_items[0].quantity, "2");
        // Provider defaults to the card provider
        assert_eq!(request.payment_provider, PaymentProvider::Stripe);
    }
}
