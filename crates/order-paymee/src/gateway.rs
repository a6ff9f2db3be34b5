//! # Paymee Gateway
//!
//! Mobile-money variant of the `PaymentGateway` capability. Paymee does
//! not sign the callback body; authenticity is a checksum recomputed as
//! `sha256(token || payment_status_flag || api_key)` and compared to the
//! `check_sum` field in the payload. Only the token and the status flag
//! are covered, so this gateway never reports an authoritative amount,
//! and the reconciler binds the token to the stored order reference
//! before trusting the rest of the payload.

use crate::config::PaymeeConfig;
use async_trait::async_trait;
use order_core::{
    format_minor_units, CallbackEvent, Order, OrderError, OrderResult, OrderStatus, PaymentEvent,
    PaymentGateway, PaymentOutcome, PaymentProvider, PaymentSession, Restaurant,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Paymee payment gateway
pub struct PaymeeGateway {
    config: PaymeeConfig,
    client: Client,
}

impl PaymeeGateway {
    pub fn new(config: PaymeeConfig) -> OrderResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| OrderError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> OrderResult<Self> {
        Self::new(PaymeeConfig::from_env()?)
    }
}

#[async_trait]
impl PaymentGateway for PaymeeGateway {
    #[instrument(skip(self, order, restaurant), fields(order_id = %order.id))]
    async fn create_session(
        &self,
        order: &Order,
        restaurant: &Restaurant,
    ) -> OrderResult<PaymentSession> {
        let request = PaymeeCreateRequest {
            amount: format_minor_units(order.total_amount),
            note: format!("Order at {}", restaurant.restaurant_name),
            first_name: order.delivery_details.first_name.clone(),
            last_name: order.delivery_details.last_name.clone(),
            email: order.delivery_details.email.clone(),
            phone: order.delivery_details.phone.clone(),
            return_url: self.config.return_url(),
            cancel_url: self.config.cancel_url(&restaurant.id),
            // Our order id rides as provider-side metadata and comes back
            // on the webhook unmodified.
            order_id: order.id.clone(),
        };

        debug!("creating Paymee payment: amount={}", request.amount);

        let url = format!("{}/api/v2/payments/create", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| OrderError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OrderError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Paymee API error: status={}, body={}", status, body);
            return Err(OrderError::Gateway {
                provider: "paymee".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: PaymeeCreateResponse = serde_json::from_str(&body).map_err(|e| {
            OrderError::Serialization(format!("failed to parse Paymee response: {}", e))
        })?;

        if !parsed.status {
            return Err(OrderError::Gateway {
                provider: "paymee".to_string(),
                message: parsed
                    .message
                    .unwrap_or_else(|| "payment creation refused".to_string()),
            });
        }

        info!("created Paymee payment: token={}", parsed.data.token);

        Ok(PaymentSession {
            redirect_url: parsed.data.payment_url,
            provider_reference: parsed.data.token,
            initial_status: OrderStatus::Pending,
        })
    }

    #[instrument(skip(self, payload, _signature))]
    async fn verify_callback(
        &self,
        payload: &[u8],
        _signature: Option<&str>,
    ) -> OrderResult<CallbackEvent> {
        let callback: PaymeeCallback = serde_json::from_slice(payload)
            .map_err(|e| OrderError::CallbackParse(format!("failed to parse callback: {}", e)))?;

        let expected = compute_checksum(
            &callback.token,
            callback.payment_status,
            &self.config.api_key,
        );

        if !constant_time_compare(&callback.check_sum, &expected) {
            return Err(OrderError::Authentication("checksum mismatch".to_string()));
        }

        debug!(
            "verified Paymee callback: token={}, status={}",
            callback.token, callback.payment_status
        );

        let outcome = if callback.payment_status {
            PaymentOutcome::Paid
        } else {
            PaymentOutcome::Failed
        };

        let order_id = callback.order_id.ok_or_else(|| {
            OrderError::CallbackParse("callback missing order_id".to_string())
        })?;

        Ok(CallbackEvent::Payment(PaymentEvent {
            provider: PaymentProvider::Paymee,
            order_id,
            outcome,
            transaction_id: callback.transaction_id.map(|id| id.to_string()),
            // The checksum covers only token and status flag, so the
            // callback amount is never treated as authoritative.
            authoritative_amount: None,
            provider_reference: Some(callback.token),
        }))
    }

    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Paymee
    }
}

// =============================================================================
// Paymee API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct PaymeeCreateRequest {
    amount: String,
    note: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    return_url: String,
    cancel_url: String,
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct PaymeeCreateResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: PaymeeCreateData,
}

#[derive(Debug, Deserialize)]
struct PaymeeCreateData {
    token: String,
    payment_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymeeCallback {
    token: String,
    check_sum: String,
    payment_status: bool,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    transaction_id: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    amount: Option<serde_json::Value>,
}

// =============================================================================
// Checksum Verification
// =============================================================================

fn compute_checksum(token: &str, payment_status: bool, api_key: &str) -> String {
    use sha2::{Digest, Sha256};

    let flag = if payment_status { "1" } else { "0" };
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(flag.as_bytes());
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
