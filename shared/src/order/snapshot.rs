//! Order snapshot - the persisted and served view of one order
//!
//! Header and lines travel together so every read is a consistent snapshot.

use super::types::{KitchenStatus, OrderItemSnapshot, OrderStatus, OrderType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Render a per-restaurant order sequence as a ticket number (`#0001`)
pub fn format_order_number(sequence: u64) -> String {
    format!("#{:04}", sequence)
}

/// Order snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (UUID v4, assigned by server)
    pub order_id: String,
    pub restaurant_id: String,
    /// Staff member who started the order
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    /// Human-readable ticket number, e.g. `#0042`
    pub order_number: String,
    /// Raw per-restaurant sequence behind `order_number`
    pub order_seq: u64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub kitchen_status: KitchenStatus,
    /// Created without items; hidden from the kitchen until items are appended
    #[serde(default)]
    pub is_draft: bool,
    pub items: Vec<OrderItemSnapshot>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub kitchen_updated_at: i64,
    pub status_updated_at: i64,
}

impl OrderSnapshot {
    /// Open orders accept item changes and hold their table
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Visible on the kitchen display
    pub fn is_kitchen_active(&self) -> bool {
        !self.is_draft && self.kitchen_status.is_active()
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItemSnapshot> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Table held by this order, if it is still open
    pub fn held_table(&self) -> Option<&str> {
        if self.is_open() {
            self.table_id.as_deref()
        } else {
            None
        }
    }
}

/// Kitchen display poll result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenFeed {
    pub restaurant_id: String,
    /// Active orders, oldest first
    pub orders: Vec<OrderSnapshot>,
    /// Server time of this read (Unix millis)
    pub generated_at: i64,
    /// Advertised re-poll cadence
    pub poll_interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            order_id: "o-1".to_string(),
            restaurant_id: "r-1".to_string(),
            created_by: "u-1".to_string(),
            customer_id: None,
            table_id: Some("t-1".to_string()),
            order_number: format_order_number(1),
            order_seq: 1,
            order_type: OrderType::DineIn,
            status: OrderStatus::Pending,
            kitchen_status: KitchenStatus::Pending,
            is_draft: false,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            cancel_reason: None,
            created_at: 0,
            updated_at: 0,
            kitchen_updated_at: 0,
            status_updated_at: 0,
        }
    }

    #[test]
    fn test_order_number_format() {
        assert_eq!(format_order_number(1), "#0001");
        assert_eq!(format_order_number(42), "#0042");
        assert_eq!(format_order_number(12345), "#12345");
    }

    #[test]
    fn test_held_table_only_while_open() {
        let mut order = snapshot();
        assert_eq!(order.held_table(), Some("t-1"));
        order.status = OrderStatus::Paid;
        assert_eq!(order.held_table(), None);
    }

    #[test]
    fn test_kitchen_visibility() {
        let mut order = snapshot();
        assert!(order.is_kitchen_active());
        order.is_draft = true;
        assert!(!order.is_kitchen_active());
        order.is_draft = false;
        order.kitchen_status = KitchenStatus::Completed;
        assert!(!order.is_kitchen_active());
    }

    #[test]
    fn test_money_serializes_as_string() {
        let mut order = snapshot();
        order.total = Decimal::new(1990, 2);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["total"], "19.90");
        assert_eq!(json["status"], "pending");
        assert!(json.get("customer_id").is_none());
    }
}
