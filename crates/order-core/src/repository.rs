//! # Order Repository
//!
//! Narrow persistence interface for order records: create, find-by-id,
//! find-by-user, and an atomic conditional terminal transition. The
//! conditional update is the storage-level serialization point for
//! concurrent webhook deliveries targeting the same order.

use crate::error::{OrderError, OrderResult};
use crate::order::{Order, OrderStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A terminal payment transition to apply to an order
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    /// Target status; must be terminal
    pub status: OrderStatus,

    /// Provider transaction reference, when the event carried one
    pub transaction_id: Option<String>,

    /// Provider-authoritative total overwriting the pricer's figure,
    /// when the provider's authentication covers the amount
    pub amount_override: Option<i64>,
}

/// Result of a conditional terminal transition
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Transition applied; returns the updated order
    Applied(Order),

    /// Order was already terminal; returns it unchanged. Not an error:
    /// duplicate webhook deliveries are acknowledged as success.
    AlreadyTerminal(Order),
}

/// Persistence collaborator for order records
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order
    async fn insert(&self, order: Order) -> OrderResult<()>;

    /// Find an order by id
    async fn find(&self, id: &str) -> OrderResult<Option<Order>>;

    /// All orders for a user, newest first
    async fn find_by_user(&self, user_id: &str) -> OrderResult<Vec<Order>>;

    /// Apply a terminal transition only if the order is currently
    /// non-terminal. Atomic with respect to concurrent calls for the same
    /// order id.
    async fn apply_payment(
        &self,
        id: &str,
        transition: PaymentTransition,
    ) -> OrderResult<TransitionOutcome>;
}

/// In-memory repository backed by a `tokio::sync::RwLock`.
///
/// The write lock makes `apply_payment` a conditional update: the
/// status check and the mutation happen under one critical section.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) -> OrderResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrderError::Persistence(format!(
                "duplicate order id: {}",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn find(&self, id: &str) -> OrderResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> OrderResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn apply_payment(
        &self,
        id: &str,
        transition: PaymentTransition,
    ) -> OrderResult<TransitionOutcome> {
        if !transition.status.is_terminal() {
            return Err(OrderError::Internal(format!(
                "apply_payment called with non-terminal status {:?}",
                transition.status
            )));
        }

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| OrderError::OrderNotFound {
                order_id: id.to_string(),
            })?;

        if order.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal(order.clone()));
        }

        order.status = transition.status;
        if let Some(transaction_id) = transition.transaction_id {
            order.transaction_id = Some(transaction_id);
        }
        if let Some(amount) = transition.amount_override {
            order.total_amount = amount;
        }

        Ok(TransitionOutcome::Applied(order.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CartLine, DeliveryDetails, PaymentProvider};

    fn order() -> Order {
        Order::new(
            "rest-1",
            "user-1",
            vec![CartLine {
                menu_item_id: "item-1".into(),
                name: "Couscous".into(),
                quantity: 1,
            }],
            DeliveryDetails {
                first_name: "Amine".into(),
                last_name: "Ben Salah".into(),
                email: "amine@example.com".into(),
                address_line1: "12 Rue de Marseille".into(),
                city: "Tunis".into(),
                phone: "21612345".into(),
            },
            800,
            PaymentProvider::Stripe,
        )
    }

    fn paid_transition() -> PaymentTransition {
        PaymentTransition {
            status: OrderStatus::Paid,
            transaction_id: Some("pi_123".into()),
            amount_override: Some(850),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let id = order.id.clone();

        repo.insert(order).await.unwrap();
        assert!(repo.find(&id).await.unwrap().is_some());
        assert!(repo.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        repo.insert(order.clone()).await.unwrap();

        let result = repo.insert(order).await;
        assert!(matches!(result, Err(OrderError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_apply_payment_sets_fields() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let id = order.id.clone();
        repo.insert(order).await.unwrap();

        let outcome = repo.apply_payment(&id, paid_transition()).await.unwrap();
        let updated = match outcome {
            TransitionOutcome::Applied(o) => o,
            TransitionOutcome::AlreadyTerminal(_) => panic!("expected Applied"),
        };

        assert_eq!(updated.status, OrderStatus::Paid);
        assert_eq!(updated.transaction_id.as_deref(), Some("pi_123"));
        assert_eq!(updated.total_amount, 850);
    }

    #[tokio::test]
    async fn test_second_transition_is_noop() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let id = order.id.clone();
        repo.insert(order).await.unwrap();

        repo.apply_payment(&id, paid_transition()).await.unwrap();

        // Second delivery of a failure event must not move a paid order
        let second = repo
            .apply_payment(
                &id,
                PaymentTransition {
                    status: OrderStatus::Failed,
                    transaction_id: Some("pi_other".into()),
                    amount_override: Some(1),
                },
            )
            .await
            .unwrap();

        let unchanged = match second {
            TransitionOutcome::AlreadyTerminal(o) => o,
            TransitionOutcome::Applied(_) => panic!("terminal order must not transition"),
        };
        assert_eq!(unchanged.status, OrderStatus::Paid);
        assert_eq!(unchanged.transaction_id.as_deref(), Some("pi_123"));
        assert_eq!(unchanged.total_amount, 850);
    }

    #[tokio::test]
    async fn test_apply_payment_unknown_order() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.apply_payment("missing", paid_transition()).await;
        assert!(matches!(result, Err(OrderError::OrderNotFound { .. })));
    }

    #[tokio::test]
    async fn test_non_terminal_transition_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = order();
        let id = order.id.clone();
        repo.insert(order).await.unwrap();

        let result = repo
            .apply_payment(
                &id,
                PaymentTransition {
                    status: OrderStatus::Pending,
                    transaction_id: None,
                    amount_override: None,
                },
            )
            .await;
        assert!(matches!(result, Err(OrderError::Internal(_))));
    }

    #[tokio::test]
    async fn test_find_by_user_newest_first() {
        let repo = InMemoryOrderRepository::new();

        let mut first = order();
        first.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let mut second = order();
        second.created_at = chrono::Utc::now();
        let newest_id = second.id.clone();

        repo.insert(first).await.unwrap();
        repo.insert(second).await.unwrap();

        let mut other_user = order();
        other_user.user_id = "user-2".into();
        repo.insert(other_user).await.unwrap();

        let orders = repo.find_by_user("user-1").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, newest_id);
    }
}
