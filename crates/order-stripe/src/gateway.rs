//! # Stripe Gateway
//!
//! Card-payment variant of the `PaymentGateway` capability: hosted
//! Checkout Sessions for collection, HMAC-SHA256 signatures over the raw
//! webhook body for callback authenticity.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::Utc;
use order_core::{
    CallbackEvent, Order, OrderError, OrderResult, OrderStatus, PaymentEvent, PaymentGateway,
    PaymentOutcome, PaymentProvider, PaymentSession, Restaurant,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session gateway
///
/// Uses Stripe's hosted checkout page; line items are built from the
/// restaurant's live menu plus one synthetic delivery item, and the order
/// and restaurant ids ride in session metadata so the webhook can locate
/// the order without trusting any other field.
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> OrderResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| OrderError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> OrderResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Build the form-encoded session parameters.
    ///
    /// One line item per cart entry priced from the current menu (a
    /// deleted item prices at zero, matching the cart pricer), plus one
    /// synthetic line item for delivery.
    fn build_form_params(&self, order: &Order, restaurant: &Restaurant) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.config.success_url()),
            (
                "cancel_url".to_string(),
                self.config.cancel_url(&restaurant.id),
            ),
            ("metadata[order_id]".to_string(), order.id.clone()),
            (
                "metadata[restaurant_id]".to_string(),
                restaurant.id.clone(),
            ),
        ];

        for (i, line) in order.cart_items.iter().enumerate() {
            let unit_amount = restaurant
                .menu_item(&line.menu_item_id)
                .map(|item| item.price)
                .unwrap_or(0);

            params.push((
                format!("line_items[{}][price_data][currency]", i),
                self.config.currency.clone(),
            ));
            params.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                unit_amount.to_string(),
            ));
            params.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                line.name.clone(),
            ));
            params.push((
                format!("line_items[{}][quantity]", i),
                line.quantity.to_string(),
            ));
        }

        let delivery_index = order.cart_items.len();
        params.push((
            format!("line_items[{}][price_data][currency]", delivery_index),
            self.config.currency.clone(),
        ));
        params.push((
            format!("line_items[{}][price_data][unit_amount]", delivery_index),
            restaurant.delivery_price.to_string(),
        ));
        params.push((
            format!(
                "line_items[{}][price_data][product_data][name]",
                delivery_index
            ),
            "Delivery".to_string(),
        ));
        params.push((
            format!("line_items[{}][quantity]", delivery_index),
            "1".to_string(),
        ));

        params
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, order, restaurant), fields(order_id = %order.id))]
    async fn create_session(
        &self,
        order: &Order,
        restaurant: &Restaurant,
    ) -> OrderResult<PaymentSession> {
        let form_params = self.build_form_params(order, restaurant);

        debug!(
            "creating Stripe checkout session: {} line items",
            order.cart_items.len() + 1
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &order.id)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| OrderError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OrderError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(OrderError::Gateway {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(OrderError::Gateway {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let session: StripeSessionResponse = serde_json::from_str(&body).map_err(|e| {
            OrderError::Serialization(format!("failed to parse Stripe response: {}", e))
        })?;

        info!("created Stripe session: id={}", session.id);

        Ok(PaymentSession {
            redirect_url: session.url,
            provider_reference: session.id,
            initial_status: OrderStatus::Placed,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_callback(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> OrderResult<CallbackEvent> {
        let signature = signature
            .ok_or_else(|| OrderError::Authentication("missing signature header".to_string()))?;

        let sig_parts = parse_signature_header(signature)?;

        // Timestamp tolerance closes the replay window (5 minutes)
        let now = Utc::now().timestamp();
        if (now - sig_parts.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(OrderError::Authentication(
                "timestamp outside tolerance".to_string(),
            ));
        }

        // The signature covers the exact raw body; any re-serialization
        // upstream would already have broken it here.
        let signed_payload = format!(
            "{}.{}",
            sig_parts.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected = compute_hmac_sha256(&self.config.webhook_secret, &signed_payload);

        let valid = sig_parts
            .signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected));

        if !valid {
            return Err(OrderError::Authentication("signature mismatch".to_string()));
        }

        let event: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| OrderError::CallbackParse(format!("failed to parse webhook: {}", e)))?;

        debug!("verified Stripe webhook: type={}", event.event_type);

        let outcome = match event.event_type.as_str() {
            "checkout.session.completed" => {
                // Async payment methods can complete the session before
                // the money clears; only payment_status=paid settles here.
                if event.data.object.payment_status.as_deref() == Some("paid") {
                    PaymentOutcome::Paid
                } else {
                    return Ok(CallbackEvent::Ignored {
                        kind: "checkout.session.completed (unpaid)".to_string(),
                    });
                }
            }
            "checkout.session.async_payment_succeeded" => PaymentOutcome::Paid,
            "checkout.session.async_payment_failed" => PaymentOutcome::Failed,
            other => {
                return Ok(CallbackEvent::Ignored {
                    kind: other.to_string(),
                })
            }
        };

        let session = event.data.object;
        let order_id = session
            .metadata
            .get("order_id")
            .cloned()
            .ok_or_else(|| {
                OrderError::CallbackParse("session metadata missing order_id".to_string())
            })?;

        Ok(CallbackEvent::Payment(PaymentEvent {
            provider: PaymentProvider::Stripe,
            order_id,
            outcome,
            transaction_id: session.payment_intent,
            // The signature covers the whole body, so Stripe's total is
            // authoritative and overwrites the pricer's figure.
            authoritative_amount: session.amount_total,
            provider_reference: Some(session.id),
        }))
    }

    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }
}

const SIGNATURE_TOLERANCE_SECS: i64 = 300;

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeSessionObject,
}

#[derive(Debug, Deserialize)]
struct StripeSessionObject {
    id: String,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

// =============================================================================
// Webhook Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> OrderResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        OrderError::Authentication("missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(OrderError::Authentication(
            "no v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
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

#[cfg(test)]
mod tests {
    use super::*;
    use order_core::{CartLine, DeliveryDetails, MenuItem};
    use serde_json::json;

    fn restaurant() -> Restaurant {
        Restaurant {
            id: "rest-1".into(),
            restaurant_name: "Chez Amine".into(),
            delivery_price: 300,
            menu_items: vec![MenuItem {
                id: "item-a".into(),
                name: "Couscous".into(),
                price: 500,
            }],
        }
    }

    fn order() -> Order {
        Order::new(
            "rest-1",
            "user-1",
            vec![
                CartLine {
                    menu_item_id: "item-a".into(),
                    name: "Couscous".into(),
                    quantity: 2,
                },
                CartLine {
                    menu_item_id: "item-gone".into(),
                    name: "Removed dish".into(),
                    quantity: 1,
                },
            ],
            DeliveryDetails {
                first_name: "Amine".into(),
                last_name: "Ben Salah".into(),
                email: "amine@example.com".into(),
                address_line1: "12 Rue de Marseille".into(),
                city: "Tunis".into(),
                phone: "21612345".into(),
            },
            1300,
            PaymentProvider::Stripe,
        )
    }

    fn gateway() -> StripeGateway {
        StripeGateway::new(StripeConfig::new(
            "sk_test_abc",
            "whsec_test",
            "https://eats.example.com",
        ))
        .unwrap()
    }

    fn signed_header(secret: &str, body: &str, timestamp: i64) -> String {
        let sig = compute_hmac_sha256(secret, &format!("{}.{}", timestamp, body));
        format!("t={},v1={}", timestamp, sig)
    }

    fn completed_body(order_id: &str) -> String {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_intent": "pi_test_456",
                    "amount_total": 2500,
                    "payment_status": "paid",
                    "metadata": { "order_id": order_id, "restaurant_id": "rest-1" }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_form_params_include_metadata_and_delivery() {
        let gateway = gateway();
        let order = order();
        let params = gateway.build_form_params(&order, &restaurant());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("metadata[order_id]"), Some(order.id.as_str()));
        assert_eq!(get("metadata[restaurant_id]"), Some("rest-1"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("500"));
        // Deleted menu item prices at zero, same as the cart pricer
        assert_eq!(get("line_items[1][price_data][unit_amount]"), Some("0"));
        // Synthetic delivery line
        assert_eq!(
            get("line_items[2][price_data][product_data][name]"),
            Some("Delivery")
        );
        assert_eq!(get("line_items[2][price_data][unit_amount]"), Some("300"));
        assert_eq!(get("line_items[2][quantity]"), Some("1"));
    }

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = parse_signature_header(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures.len(), 2);
        assert_eq!(parsed.signatures[0], "abc123");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[tokio::test]
    async fn test_verify_valid_completed_event() {
        let gateway = gateway();
        let body = completed_body("ord-1");
        let header = signed_header("whsec_test", &body, Utc::now().timestamp());

        let event = gateway
            .verify_callback(body.as_bytes(), Some(&header))
            .await
            .unwrap();

        let event = match event {
            CallbackEvent::Payment(e) => e,
            CallbackEvent::Ignored { kind } => panic!("unexpected ignore: {}", kind),
        };
        assert_eq!(event.order_id, "ord-1");
        assert_eq!(event.outcome, PaymentOutcome::Paid);
        assert_eq!(event.transaction_id.as_deref(), Some("pi_test_456"));
        assert_eq!(event.authoritative_amount, Some(2500));
        assert_eq!(event.provider_reference.as_deref(), Some("cs_test_123"));
    }

    #[tokio::test]
    async fn test_verify_rejects_tampered_body() {
        let gateway = gateway();
        let body = completed_body("ord-1");
        let header = signed_header("whsec_test", &body, Utc::now().timestamp());

        let tampered = body.replace("2500", "1");
        let result = gateway
            .verify_callback(tampered.as_bytes(), Some(&header))
            .await;
        assert!(matches!(result, Err(OrderError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_verify_rejects_stale_timestamp() {
        let gateway = gateway();
        let body = completed_body("ord-1");
        let stale = Utc::now().timestamp() - 3600;
        let header = signed_header("whsec_test", &body, stale);

        let result = gateway.verify_callback(body.as_bytes(), Some(&header)).await;
        assert!(matches!(result, Err(OrderError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_header() {
        let gateway = gateway();
        let body = completed_body("ord-1");

        let result = gateway.verify_callback(body.as_bytes(), None).await;
        assert!(matches!(result, Err(OrderError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_unpaid_completed_session_ignored() {
        let gateway = gateway();
        let body = completed_body("ord-1").replace("\"paid\"", "\"unpaid\"");
        let header = signed_header("whsec_test", &body, Utc::now().timestamp());

        let event = gateway
            .verify_callback(body.as_bytes(), Some(&header))
            .await
            .unwrap();
        assert!(matches!(event, CallbackEvent::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_failed_payment_event() {
        let gateway = gateway();
        let body = completed_body("ord-1")
            .replace("checkout.session.completed", "checkout.session.async_payment_failed");
        let header = signed_header("whsec_test", &body, Utc::now().timestamp());

        let event = gateway
            .verify_callback(body.as_bytes(), Some(&header))
            .await
            .unwrap();
        let event = match event {
            CallbackEvent::Payment(e) => e,
            CallbackEvent::Ignored { kind } => panic!("unexpected ignore: {}", kind),
        };
        assert_eq!(event.outcome, PaymentOutcome::Failed);
    }

    #[tokio::test]
    async fn test_missing_order_id_metadata() {
        let gateway = gateway();
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_status": "paid",
                    "metadata": {}
                }
            }
        })
        .to_string();
        let header = signed_header("whsec_test", &body, Utc::now().timestamp());

        let result = gateway.verify_callback(body.as_bytes(), Some(&header)).await;
        assert!(matches!(result, Err(OrderError::CallbackParse(_))));
    }

    #[tokio::test]
    async fn test_create_session_against_mock() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_789",
                "url": "https://checkout.stripe.com/c/pay/cs_test_789"
            })))
            .mount(&server)
            .await;

        let config = StripeConfig::new("sk_test_abc", "whsec_test", "https://eats.example.com")
            .with_api_base_url(server.uri());
        let gateway = StripeGateway::new(config).unwrap();

        let session = gateway.create_session(&order(), &restaurant()).await.unwrap();
        assert_eq!(session.provider_reference, "cs_test_789");
        assert_eq!(session.initial_status, OrderStatus::Placed);
        assert!(session.redirect_url.contains("cs_test_789"));
    }

    #[tokio::test]
    async fn test_create_session_provider_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid currency" }
            })))
            .mount(&server)
            .await;

        let config = StripeConfig::new("sk_test_abc", "whsec_test", "https://eats.example.com")
            .with_api_base_url(server.uri());
        let gateway = StripeGateway::new(config).unwrap();

        let result = gateway.create_session(&order(), &restaurant()).await;
        match result {
            Err(OrderError::Gateway { provider, message }) => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Invalid currency");
            }
            other => panic!("expected gateway error, got {:?}", other.map(|_| ())),
        }
    }
}
