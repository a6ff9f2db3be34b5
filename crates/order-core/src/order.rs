//! # Order Types
//!
//! The order record is the unit of payment state: created by checkout,
//! promoted exactly once to a terminal status by webhook reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment provider handling an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Card payments via Stripe Checkout (signature-authenticated webhooks)
    Stripe,
    /// Mobile-money payments via Paymee (checksum-authenticated webhooks)
    Paymee,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Paymee => "paymee",
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order payment lifecycle
///
/// Transitions are forward-only; `Paid` and `Failed` are terminal and may
/// each be reached at most once per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, provider session issued, payment not yet started
    Placed,
    /// Provider session issued, awaiting asynchronous confirmation
    Pending,
    /// Payment confirmed by a verified provider event
    Paid,
    /// Payment rejected by a verified provider event
    Failed,
    /// Abandoned by the diner before payment
    Canceled,
}

impl OrderStatus {
    /// Terminal statuses accept no further payment transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Failed)
    }
}

/// A resolved cart line on a persisted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Menu item id at the time of checkout
    pub menu_item_id: String,

    /// Item name (denormalized for display)
    pub name: String,

    /// Quantity, already parsed and validated
    pub quantity: u32,
}

/// Recipient contact and address, immutable after order creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address_line1: String,
    pub city: String,
    pub phone: String,
}

impl DeliveryDetails {
    /// All fields are required; returns the first missing field name
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("phone", &self.phone),
        ];
        fields
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

/// A persisted order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique, provider-opaque order id (UUID v4)
    pub id: String,

    /// Owning restaurant (foreign-key style reference)
    pub restaurant_id: String,

    /// Authenticated user who placed the order
    pub user_id: String,

    /// Resolved cart lines
    pub cart_items: Vec<CartLine>,

    /// Delivery recipient, set once at creation
    pub delivery_details: DeliveryDetails,

    /// Total in minor currency units; pricer-computed, may be overwritten
    /// by a provider-authoritative amount during reconciliation
    pub total_amount: i64,

    /// Payment lifecycle status
    pub status: OrderStatus,

    /// Provider transaction reference, set only on a terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Provider this order was checked out with
    pub provider: PaymentProvider,

    /// Session id / token returned by `create_session`, used to cross-check
    /// callbacks against the order they claim to settle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,

    /// Created timestamp, immutable
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with a generated id, not yet persisted.
    ///
    /// The id is generated before the provider session so it can ride in
    /// provider metadata and come back on the webhook.
    pub fn new(
        restaurant_id: impl Into<String>,
        user_id: impl Into<String>,
        cart_items: Vec<CartLine>,
        delivery_details: DeliveryDetails,
        total_amount: i64,
        provider: PaymentProvider,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.into(),
            user_id: user_id.into(),
            cart_items,
            delivery_details,
            total_amount,
            status: OrderStatus::Placed,
            transaction_id: None,
            provider,
            provider_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Check if the order has reached a terminal payment outcome
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
