//! POS session - the cashier workflow
//!
//! Start an order, attach items, take payment. Status changes go through
//! [`OrderStateMachine`]; the session never writes a status itself.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::order::{
    ItemChange, OrderItemInput, OrderSnapshot, OrderStatus, OrderTransition, PaymentInput,
    PaymentRecord, PaymentState, StartOrder,
};

use super::payment::{PaymentOutcome, PaymentProcessor};
use crate::auth::CurrentUser;
use crate::auth::permissions::{ORDERS_CREATE, ORDERS_SETTLE};
use crate::core::RestaurantScope;
use crate::orders::{
    NewOrder, OrderError, OrderResult, OrderStateMachine, OrderStore, PaymentResolution,
};
use crate::services::CatalogService;

/// Result of a successful checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order: OrderSnapshot,
    pub payment: PaymentRecord,
}

#[derive(Clone)]
pub struct PosSession {
    store: OrderStore,
    state_machine: OrderStateMachine,
    catalog: CatalogService,
    processor: Arc<dyn PaymentProcessor>,
}

impl std::fmt::Debug for PosSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosSession").finish_non_exhaustive()
    }
}

fn require(actor: &CurrentUser, permission: &str) -> OrderResult<()> {
    if actor.has_permission(permission) {
        Ok(())
    } else {
        Err(OrderError::Forbidden(format!(
            "{} lacks {}",
            actor.username, permission
        )))
    }
}

impl PosSession {
    pub fn new(
        store: OrderStore,
        state_machine: OrderStateMachine,
        catalog: CatalogService,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            store,
            state_machine,
            catalog,
            processor,
        }
    }

    /// Start an order; an empty item list creates a draft
    pub fn start_order(
        &self,
        scope: &RestaurantScope,
        actor: &CurrentUser,
        request: StartOrder,
    ) -> OrderResult<OrderSnapshot> {
        require(actor, ORDERS_CREATE)?;
        let new = NewOrder {
            order_type: request.order_type,
            table_id: request.table_id.filter(|t| !t.trim().is_empty()),
            customer_id: request.customer_id,
            draft: request.items.is_empty(),
            items: request.items,
        };
        self.store.create(scope, actor, new, &self.catalog)
    }

    pub fn append_items(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        items: &[OrderItemInput],
        actor: &CurrentUser,
    ) -> OrderResult<OrderSnapshot> {
        require(actor, ORDERS_CREATE)?;
        self.store.append_items(scope, order_id, items, &self.catalog)
    }

    pub fn update_items(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        changes: &[ItemChange],
        actor: &CurrentUser,
    ) -> OrderResult<OrderSnapshot> {
        require(actor, ORDERS_CREATE)?;
        self.store.update_items(scope, order_id, changes)
    }

    /// Take payment and mark the order paid
    ///
    /// A rejected payment leaves the order pending with its table held. If
    /// the order changed while the processor was deciding, the accepted
    /// payment is voided and the transition error returned. A total that
    /// grew past the payment is reported as a conflict.
    pub async fn checkout(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        input: PaymentInput,
        actor: &CurrentUser,
    ) -> OrderResult<CheckoutReceipt> {
        require(actor, ORDERS_SETTLE)?;

        let order = self.store.get(scope, order_id)?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::invalid_transition(order.status, OrderStatus::Paid));
        }
        if order.items.is_empty() {
            return Err(OrderError::Validation("cannot check out an empty order".into()));
        }
        if input.amount <= Decimal::ZERO {
            return Err(OrderError::Validation("payment amount must be positive".into()));
        }
        if input.amount < order.total {
            return Err(OrderError::Validation(format!(
                "payment {} does not cover the total {}",
                input.amount, order.total
            )));
        }
        if let Some(tendered) = input.tendered
            && tendered.is_sign_negative()
        {
            return Err(OrderError::Validation("tendered amount must not be negative".into()));
        }

        let attempt = self
            .store
            .record_payment_attempt(scope, order_id, actor, &input)?;

        let outcome = match self.processor.authorize(&attempt).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(order_id, attempt = attempt.attempt, error = %e, "Payment processor failed");
                PaymentOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        };

        let (change, reference) = match outcome {
            PaymentOutcome::Accepted { change, reference } => (change, reference),
            PaymentOutcome::Rejected { reason } => {
                self.store.resolve_payment(
                    scope,
                    order_id,
                    attempt.attempt,
                    PaymentResolution {
                        state: PaymentState::Rejected,
                        change: None,
                        reference: None,
                        failure_reason: Some(reason.clone()),
                    },
                )?;
                tracing::info!(order_id, attempt = attempt.attempt, %reason, "Payment rejected");
                return Err(OrderError::PaymentFailed(reason));
            }
        };

        let payment = self.store.resolve_payment(
            scope,
            order_id,
            attempt.attempt,
            PaymentResolution {
                state: PaymentState::Accepted,
                change,
                reference,
                failure_reason: None,
            },
        )?;

        let transition = OrderTransition {
            expected: OrderStatus::Pending,
            target: OrderStatus::Paid,
            reason: None,
        };
        match self
            .state_machine
            .apply_order_transition(scope, order_id, transition, actor)
        {
            Ok(order) => {
                tracing::info!(
                    order_id,
                    order_number = %order.order_number,
                    total = %order.total,
                    method = ?payment.method,
                    actor = %actor.id,
                    "Order checked out"
                );
                Ok(CheckoutReceipt { order, payment })
            }
            Err(err) => {
                // The order was not marked paid; do not keep the money
                tracing::warn!(order_id, error = %err, "Order changed during checkout, voiding payment");
                if let Err(e) = self.processor.void(&payment).await {
                    tracing::error!(order_id, payment_id = %payment.payment_id, error = %e, "Failed to void payment");
                }
                self.store.resolve_payment(
                    scope,
                    order_id,
                    payment.attempt,
                    PaymentResolution {
                        state: PaymentState::Voided,
                        change: None,
                        reference: None,
                        failure_reason: Some(err.to_string()),
                    },
                )?;
                if matches!(err, OrderError::PaymentRequired(_)) {
                    let current = self.store.get(scope, order_id)?;
                    if current.total != order.total {
                        return Err(OrderError::conflict(order_id, order.total, current.total));
                    }
                }
                Err(err)
            }
        }
    }

    /// Cancel a pending order
    pub fn cancel(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        reason: Option<String>,
        actor: &CurrentUser,
    ) -> OrderResult<OrderSnapshot> {
        self.state_machine.apply_order_transition(
            scope,
            order_id,
            OrderTransition {
                expected: OrderStatus::Pending,
                target: OrderStatus::Cancelled,
                reason,
            },
            actor,
        )
    }
}
