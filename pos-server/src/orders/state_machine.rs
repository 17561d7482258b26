//! Order state machine
//!
//! Validates and applies the two independent status dimensions of an order:
//!
//! ```text
//! kitchen: pending → preparing → ready → completed
//! order:   pending → paid → refunded
//!              └──→ cancelled
//! ```
//!
//! Every transition names the status the actor last saw (`expected`). The
//! check order is fixed: capability, lookup in scope, rule, then the
//! stored-status comparison inside the write transaction.

use shared::order::{
    KitchenStatus, KitchenTransition, OrderChangeKind, OrderSnapshot, OrderStatus, OrderTransition,
};
use shared::util::now_millis;

use super::error::{OrderError, OrderResult};
use super::storage::OrderStore;
use crate::auth::CurrentUser;
use crate::auth::permissions::{KITCHEN_ADVANCE, ORDERS_REFUND, ORDERS_SETTLE, ORDERS_VOID};
use crate::core::RestaurantScope;

/// Single authority for order and kitchen status changes
#[derive(Debug, Clone)]
pub struct OrderStateMachine {
    store: OrderStore,
}

impl OrderStateMachine {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }

    /// Rule check: `target` must be the immediate successor of `expected`
    pub fn validate_kitchen_transition(transition: &KitchenTransition) -> OrderResult<()> {
        if transition.expected.next() == Some(transition.target) {
            Ok(())
        } else {
            Err(OrderError::invalid_transition(
                transition.expected,
                transition.target,
            ))
        }
    }

    /// Rule check: `pending → {paid, cancelled}`, `paid → refunded`
    pub fn validate_order_transition(transition: &OrderTransition) -> OrderResult<()> {
        let allowed = matches!(
            (transition.expected, transition.target),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Refunded)
        );
        if allowed {
            Ok(())
        } else {
            Err(OrderError::invalid_transition(
                transition.expected,
                transition.target,
            ))
        }
    }

    /// Advance the kitchen status of an order
    ///
    /// Reaching `completed` drops the order from the kitchen display; the
    /// order status is left alone.
    pub fn apply_kitchen_transition(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        transition: KitchenTransition,
        actor: &CurrentUser,
    ) -> OrderResult<OrderSnapshot> {
        if !actor.has_permission(KITCHEN_ADVANCE) {
            return Err(OrderError::Forbidden(format!(
                "{} cannot advance kitchen status",
                actor.username
            )));
        }

        let txn = self.store.begin_write()?;
        let mut snapshot = self.store.load_order_txn(&txn, scope, order_id)?;
        Self::validate_kitchen_transition(&transition)?;
        if snapshot.is_draft {
            return Err(OrderError::invalid_transition("draft", transition.target));
        }
        if snapshot.kitchen_status != transition.expected {
            return Err(OrderError::conflict(
                order_id,
                transition.expected,
                snapshot.kitchen_status,
            ));
        }

        let now = now_millis();
        snapshot.kitchen_status = transition.target;
        snapshot.kitchen_updated_at = now;
        snapshot.updated_at = now;
        self.store.save_order_txn(&txn, &snapshot)?;
        if transition.target == KitchenStatus::Completed {
            self.store.remove_from_kitchen_txn(&txn, &snapshot)?;
        }
        txn.commit()?;

        tracing::info!(
            order_id,
            from = %transition.expected,
            to = %transition.target,
            actor = %actor.id,
            "Kitchen status advanced"
        );
        self.store
            .publish(OrderChangeKind::KitchenStatusChanged, &snapshot);
        Ok(snapshot)
    }

    /// Change the order (payment) status
    ///
    /// Entering `paid` or `cancelled` releases the held table in the same
    /// transaction.
    pub fn apply_order_transition(
        &self,
        scope: &RestaurantScope,
        order_id: &str,
        transition: OrderTransition,
        actor: &CurrentUser,
    ) -> OrderResult<OrderSnapshot> {
        match transition.target {
            OrderStatus::Paid if !actor.has_permission(ORDERS_SETTLE) => {
                return Err(OrderError::Forbidden(format!(
                    "{} cannot settle orders",
                    actor.username
                )));
            }
            OrderStatus::Refunded if !actor.has_permission(ORDERS_REFUND) => {
                return Err(OrderError::Forbidden(format!(
                    "{} cannot refund orders",
                    actor.username
                )));
            }
            _ => {}
        }

        let txn = self.store.begin_write()?;
        let mut snapshot = self.store.load_order_txn(&txn, scope, order_id)?;

        // Creators may cancel their own orders
        if transition.target == OrderStatus::Cancelled
            && snapshot.created_by != actor.id
            && !actor.has_permission(ORDERS_VOID)
        {
            return Err(OrderError::Forbidden(format!(
                "{} cannot cancel an order started by someone else",
                actor.username
            )));
        }

        Self::validate_order_transition(&transition)?;
        if snapshot.status != transition.expected {
            return Err(OrderError::conflict(
                order_id,
                transition.expected,
                snapshot.status,
            ));
        }
        // Accepted payments must cover the total as stored in this transaction
        if transition.target == OrderStatus::Paid
            && self.store.accepted_payment_total_txn(&txn, order_id)? < snapshot.total
        {
            return Err(OrderError::PaymentRequired(order_id.to_string()));
        }

        let now = now_millis();
        snapshot.status = transition.target;
        snapshot.status_updated_at = now;
        snapshot.updated_at = now;
        if transition.target == OrderStatus::Cancelled {
            snapshot.cancel_reason = transition.reason.filter(|r| !r.trim().is_empty());
        }
        self.store.save_order_txn(&txn, &snapshot)?;
        if matches!(
            transition.target,
            OrderStatus::Paid | OrderStatus::Cancelled
        ) {
            self.store.release_table_txn(&txn, &snapshot)?;
        }
        txn.commit()?;

        tracing::info!(
            order_id,
            from = %transition.expected,
            to = %transition.target,
            actor = %actor.id,
            "Order status changed"
        );
        self.store.publish(OrderChangeKind::StatusChanged, &snapshot);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::storage::{NewOrder, PaymentResolution};
    use crate::services::CatalogService;
    use rust_decimal_macros::dec;
    use shared::models::{CatalogProductUpsert, DiningTableUpsert, TableStatus};
    use shared::order::{
        ItemChange, OrderItemInput, OrderType, PaymentInput, PaymentMethod, PaymentState,
    };
    use std::sync::{Arc, Barrier};

    fn scope() -> RestaurantScope {
        RestaurantScope::new("r-1")
    }

    fn user(id: &str, role: &str) -> CurrentUser {
        CurrentUser {
            id: id.into(),
            username: id.into(),
            role: role.into(),
            permissions: crate::auth::permissions::get_default_permissions(role),
            restaurant_id: Some("r-1".into()),
        }
    }

    struct Fixture {
        store: OrderStore,
        catalog: CatalogService,
        machine: OrderStateMachine,
    }

    fn fixture() -> Fixture {
        let store = OrderStore::open_in_memory().unwrap();
        let catalog = CatalogService::new(store.clone());
        catalog
            .upsert(
                &scope(),
                "pasta",
                CatalogProductUpsert {
                    name: "Pasta".into(),
                    price: dec!(12.00),
                    tax_rate: dec!(10),
                    is_active: true,
                    sizes: vec![],
                    addons: vec![],
                },
            )
            .unwrap();
        store
            .upsert_table(
                &scope(),
                "t-1",
                DiningTableUpsert {
                    area_id: "main".into(),
                    name: "T-1".into(),
                    capacity: 4,
                    status: None,
                },
            )
            .unwrap();
        let machine = OrderStateMachine::new(store.clone());
        Fixture {
            store,
            catalog,
            machine,
        }
    }

    impl Fixture {
        fn dine_in(&self, items: u32) -> OrderSnapshot {
            let items = (0..items)
                .map(|_| OrderItemInput {
                    product_id: "pasta".into(),
                    size_id: None,
                    quantity: 1,
                    addons: vec![],
                    notes: None,
                })
                .collect();
            self.store
                .create(
                    &scope(),
                    &user("waiter-1", "waiter"),
                    NewOrder {
                        order_type: OrderType::DineIn,
                        table_id: Some("t-1".into()),
                        customer_id: None,
                        items,
                        draft: false,
                    },
                    &self.catalog,
                )
                .unwrap()
        }

        fn accept_payment(&self, order: &OrderSnapshot) {
            self.accept_amount(order, order.total);
        }

        fn accept_amount(&self, order: &OrderSnapshot, amount: rust_decimal::Decimal) {
            let record = self
                .store
                .record_payment_attempt(
                    &scope(),
                    &order.order_id,
                    &user("cashier-1", "cashier"),
                    &PaymentInput {
                        method: PaymentMethod::Card,
                        amount,
                        tendered: None,
                        reference: Some("AP-1".into()),
                    },
                )
                .unwrap();
            self.store
                .resolve_payment(
                    &scope(),
                    &order.order_id,
                    record.attempt,
                    PaymentResolution {
                        state: PaymentState::Accepted,
                        change: None,
                        reference: None,
                        failure_reason: None,
                    },
                )
                .unwrap();
        }

        fn table_status(&self) -> TableStatus {
            self.store.get_table(&scope(), "t-1").unwrap().status
        }
    }

    fn kitchen(expected: KitchenStatus, target: KitchenStatus) -> KitchenTransition {
        KitchenTransition { expected, target }
    }

    fn order(expected: OrderStatus, target: OrderStatus) -> OrderTransition {
        OrderTransition {
            expected,
            target,
            reason: None,
        }
    }

    #[test]
    fn test_kitchen_rules_only_allow_immediate_successor() {
        for (i, from) in KitchenStatus::SEQUENCE.iter().enumerate() {
            for (j, to) in KitchenStatus::SEQUENCE.iter().enumerate() {
                let result = OrderStateMachine::validate_kitchen_transition(&kitchen(*from, *to));
                assert_eq!(result.is_ok(), j == i + 1, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_order_rules() {
        use OrderStatus::*;
        let all = [Pending, Paid, Cancelled, Refunded];
        let allowed = [(Pending, Paid), (Pending, Cancelled), (Paid, Refunded)];
        for from in all {
            for to in all {
                let result = OrderStateMachine::validate_order_transition(&order(from, to));
                assert_eq!(result.is_ok(), allowed.contains(&(from, to)));
            }
        }
    }

    #[test]
    fn test_full_kitchen_walk_with_duplicate_advance() {
        let f = fixture();
        let chef = user("chef-1", "chef");
        let o = f.dine_in(4);

        let mut seen = vec![o.kitchen_status];
        for target in [KitchenStatus::Preparing, KitchenStatus::Ready] {
            let expected = *seen.last().unwrap();
            let s = f
                .machine
                .apply_kitchen_transition(&scope(), &o.order_id, kitchen(expected, target), &chef)
                .unwrap();
            seen.push(s.kitchen_status);
        }

        // Second "ready" tap from a screen that already shows ready
        assert!(matches!(
            f.machine.apply_kitchen_transition(
                &scope(),
                &o.order_id,
                kitchen(KitchenStatus::Ready, KitchenStatus::Ready),
                &chef
            ),
            Err(OrderError::InvalidTransition { .. })
        ));

        let done = f
            .machine
            .apply_kitchen_transition(
                &scope(),
                &o.order_id,
                kitchen(KitchenStatus::Ready, KitchenStatus::Completed),
                &chef,
            )
            .unwrap();
        seen.push(done.kitchen_status);
        assert_eq!(seen, KitchenStatus::SEQUENCE.to_vec());

        // Completed orders leave the feed but keep their order status
        assert_eq!(done.status, OrderStatus::Pending);
        assert!(f.store.list_active_for_kitchen(&scope()).unwrap().is_empty());
    }

    #[test]
    fn test_kitchen_checks_run_in_order() {
        let f = fixture();
        let o = f.dine_in(1);

        // Capability before lookup
        assert!(matches!(
            f.machine.apply_kitchen_transition(
                &scope(),
                "missing",
                kitchen(KitchenStatus::Pending, KitchenStatus::Preparing),
                &user("waiter-1", "waiter")
            ),
            Err(OrderError::Forbidden(_))
        ));
        // Lookup before rule
        assert!(matches!(
            f.machine.apply_kitchen_transition(
                &scope(),
                "missing",
                kitchen(KitchenStatus::Pending, KitchenStatus::Ready),
                &user("chef-1", "chef")
            ),
            Err(OrderError::NotFound(..))
        ));
        // Another restaurant cannot see the order
        assert!(matches!(
            f.machine.apply_kitchen_transition(
                &RestaurantScope::new("r-2"),
                &o.order_id,
                kitchen(KitchenStatus::Pending, KitchenStatus::Preparing),
                &user("chef-1", "chef")
            ),
            Err(OrderError::NotFound(..))
        ));
        // Valid rule, stale expectation
        assert!(matches!(
            f.machine.apply_kitchen_transition(
                &scope(),
                &o.order_id,
                kitchen(KitchenStatus::Preparing, KitchenStatus::Ready),
                &user("chef-1", "chef")
            ),
            Err(OrderError::Conflict { .. })
        ));
    }

    #[test]
    fn test_concurrent_advance_exactly_one_wins() {
        let f = fixture();
        let o = f.dine_in(2);
        let machine = Arc::new(f.machine.clone());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let machine = machine.clone();
                let barrier = barrier.clone();
                let order_id = o.order_id.clone();
                std::thread::spawn(move || {
                    let chef = user(&format!("chef-{}", i), "chef");
                    barrier.wait();
                    machine.apply_kitchen_transition(
                        &scope(),
                        &order_id,
                        kitchen(KitchenStatus::Pending, KitchenStatus::Preparing),
                        &chef,
                    )
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(OrderError::Conflict { .. })))
            .count();
        assert_eq!((wins, conflicts), (1, 1));
        assert_eq!(
            f.store.get(&scope(), &o.order_id).unwrap().kitchen_status,
            KitchenStatus::Preparing
        );
    }

    #[test]
    fn test_paid_requires_accepted_payment_and_releases_table() {
        let f = fixture();
        let cashier = user("cashier-1", "cashier");
        let o = f.dine_in(1);
        assert_eq!(f.table_status(), TableStatus::Occupied);

        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &cashier
            ),
            Err(OrderError::PaymentRequired(_))
        ));
        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &user("waiter-1", "waiter")
            ),
            Err(OrderError::Forbidden(_))
        ));

        f.accept_payment(&o);
        let paid = f
            .machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &cashier,
            )
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(f.table_status(), TableStatus::Available);

        // Paid orders are frozen
        assert!(matches!(
            f.store.update_items(
                &scope(),
                &o.order_id,
                &[ItemChange::SetQuantity {
                    item_id: o.items[0].item_id.clone(),
                    quantity: 5
                }]
            ),
            Err(OrderError::Immutable(_))
        ));
        assert_eq!(f.store.get(&scope(), &o.order_id).unwrap().items, o.items);
    }

    #[test]
    fn test_paid_requires_payments_covering_total() {
        let f = fixture();
        let cashier = user("cashier-1", "cashier");
        let o = f.dine_in(2);
        assert_eq!(o.total, dec!(26.40));

        f.accept_amount(&o, dec!(13.20));
        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &cashier
            ),
            Err(OrderError::PaymentRequired(_))
        ));
        assert_eq!(
            f.store.get(&scope(), &o.order_id).unwrap().status,
            OrderStatus::Pending
        );
        assert_eq!(f.table_status(), TableStatus::Occupied);

        // Accepted attempts add up
        f.accept_amount(&o, dec!(13.20));
        let paid = f
            .machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &cashier,
            )
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
    }

    #[test]
    fn test_refund_requires_capability() {
        let f = fixture();
        let o = f.dine_in(1);
        f.accept_payment(&o);
        f.machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Paid),
                &user("cashier-1", "cashier"),
            )
            .unwrap();

        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Paid, OrderStatus::Refunded),
                &user("cashier-1", "cashier")
            ),
            Err(OrderError::Forbidden(_))
        ));
        let refunded = f
            .machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Paid, OrderStatus::Refunded),
                &user("manager-1", "manager"),
            )
            .unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);

        // Payment records are left as they were
        let payments = f.store.list_payments(&scope(), &o.order_id).unwrap();
        assert_eq!(payments[0].state, PaymentState::Accepted);
    }

    #[test]
    fn test_cancel_by_creator_or_void_capability() {
        let f = fixture();
        let o = f.dine_in(1);

        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Cancelled),
                &user("waiter-2", "waiter")
            ),
            Err(OrderError::Forbidden(_))
        ));

        let cancelled = f
            .machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                OrderTransition {
                    expected: OrderStatus::Pending,
                    target: OrderStatus::Cancelled,
                    reason: Some("customer left".into()),
                },
                &user("waiter-1", "waiter"),
            )
            .unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("customer left"));
        assert_eq!(f.table_status(), TableStatus::Available);

        // Cancelled is terminal
        assert!(matches!(
            f.machine.apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Cancelled, OrderStatus::Paid),
                &user("manager-1", "manager")
            ),
            Err(OrderError::InvalidTransition { .. })
        ));

        let second = f.dine_in(1);
        f.machine
            .apply_order_transition(
                &scope(),
                &second.order_id,
                order(OrderStatus::Pending, OrderStatus::Cancelled),
                &user("manager-1", "manager"),
            )
            .unwrap();
    }

    #[test]
    fn test_release_leaves_staff_status_alone() {
        let f = fixture();
        let o = f.dine_in(1);
        f.store
            .set_table_status(&scope(), "t-1", TableStatus::Occupied, TableStatus::Cleaning)
            .unwrap();

        f.machine
            .apply_order_transition(
                &scope(),
                &o.order_id,
                order(OrderStatus::Pending, OrderStatus::Cancelled),
                &user("waiter-1", "waiter"),
            )
            .unwrap();
        assert_eq!(f.table_status(), TableStatus::Cleaning);
    }

    #[test]
    fn test_transitions_publish_changes() {
        let f = fixture();
        let o = f.dine_in(1);
        let mut rx = f.store.subscribe();
        f.machine
            .apply_kitchen_transition(
                &scope(),
                &o.order_id,
                kitchen(KitchenStatus::Pending, KitchenStatus::Preparing),
                &user("chef-1", "chef"),
            )
            .unwrap();
        let change = rx.try_recv().unwrap();
        assert_eq!(change.kind, OrderChangeKind::KitchenStatusChanged);
        assert_eq!(change.snapshot.kitchen_status, KitchenStatus::Preparing);
    }
}
