//! Shared types for the order lifecycle

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Statuses
// ============================================================================

/// Order (payment) status
///
/// `pending -> {paid, cancelled}`, `paid -> refunded`.
/// `cancelled` and `refunded` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Open orders hold their table and accept item changes
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kitchen preparation status, strictly linear
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum KitchenStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
}

impl KitchenStatus {
    /// All kitchen statuses in lifecycle order
    pub const SEQUENCE: [KitchenStatus; 4] = [
        KitchenStatus::Pending,
        KitchenStatus::Preparing,
        KitchenStatus::Ready,
        KitchenStatus::Completed,
    ];

    /// Immediate successor, `None` once completed
    pub fn next(&self) -> Option<KitchenStatus> {
        match self {
            KitchenStatus::Pending => Some(KitchenStatus::Preparing),
            KitchenStatus::Preparing => Some(KitchenStatus::Ready),
            KitchenStatus::Ready => Some(KitchenStatus::Completed),
            KitchenStatus::Completed => None,
        }
    }

    /// Still visible on the kitchen display
    pub fn is_active(&self) -> bool {
        !matches!(self, KitchenStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KitchenStatus::Pending => "pending",
            KitchenStatus::Preparing => "preparing",
            KitchenStatus::Ready => "ready",
            KitchenStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for KitchenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Eat in; holds a table
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    /// Dine-in orders must hold a table, the others must not
    pub fn requires_table(&self) -> bool {
        matches!(self, OrderType::DineIn)
    }
}

// ============================================================================
// Item Types
// ============================================================================

/// Addon snapshot captured at add time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonLine {
    pub addon_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Order line snapshot
///
/// Prices, names and tax rate are copied from the catalog when the line is
/// added and never follow later catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemSnapshot {
    pub item_id: String,
    pub product_id: String,
    /// Product name snapshot
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_name: Option<String>,
    pub quantity: u32,
    /// Size price when a size is chosen, else product price
    pub unit_price: Decimal,
    #[serde(default)]
    pub addons: Vec<AddonLine>,
    /// Tax rate in percent (e.g. 10 = 10%)
    pub tax_rate: Decimal,
    /// (unit_price + addons) * quantity
    pub line_total: Decimal,
    pub tax: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Addon selection in an item input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonInput {
    pub addon_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Item input for creating or appending to an order
///
/// Only references are supplied; names and prices are resolved from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemInput {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub addons: Vec<AddonInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Modification of an existing order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ItemChange {
    SetQuantity { item_id: String, quantity: u32 },
    SetNotes {
        item_id: String,
        #[serde(default)]
        notes: Option<String>,
    },
    Remove { item_id: String },
}

impl ItemChange {
    pub fn item_id(&self) -> &str {
        match self {
            ItemChange::SetQuantity { item_id, .. }
            | ItemChange::SetNotes { item_id, .. }
            | ItemChange::Remove { item_id } => item_id,
        }
    }
}

/// Request body for starting an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartOrder {
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Empty list creates a draft
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

// ============================================================================
// Transition Requests
// ============================================================================

/// Kitchen status change, conditioned on the status the actor last saw
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitchenTransition {
    pub expected: KitchenStatus,
    pub target: KitchenStatus,
}

/// Order status change, conditioned on the status the actor last saw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderTransition {
    pub expected: OrderStatus,
    pub target: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// Payment Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Other,
}

/// Payment input at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub amount: Decimal,
    /// Cash handed over by the customer (cash only, defaults to amount)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendered: Option<Decimal>,
    /// Card terminal approval code or other external reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Payment attempt state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Accepted,
    Rejected,
    Voided,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Accepted => "accepted",
            PaymentState::Rejected => "rejected",
            PaymentState::Voided => "voided",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded payment attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub order_id: String,
    pub restaurant_id: String,
    /// Attempt number within the order, starting at 1
    pub attempt: u32,
    pub method: PaymentMethod,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub state: PaymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub recorded_by: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_sequence_follows_next() {
        let mut walked = vec![KitchenStatus::Pending];
        while let Some(next) = walked.last().and_then(|s| s.next()) {
            walked.push(next);
        }
        assert_eq!(walked, KitchenStatus::SEQUENCE.to_vec());
        assert!(!KitchenStatus::Completed.is_active());
        assert!(KitchenStatus::Ready.is_active());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&OrderType::DineIn).unwrap(),
            "\"dine_in\""
        );
        let status: KitchenStatus = serde_json::from_str("\"preparing\"").unwrap();
        assert_eq!(status, KitchenStatus::Preparing);
    }

    #[test]
    fn test_order_status_classes() {
        assert!(OrderStatus::Pending.is_open());
        assert!(!OrderStatus::Paid.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_item_change_tagged() {
        let change: ItemChange =
            serde_json::from_str(r#"{"action":"set_quantity","item_id":"i-1","quantity":3}"#)
                .unwrap();
        assert_eq!(
            change,
            ItemChange::SetQuantity {
                item_id: "i-1".to_string(),
                quantity: 3
            }
        );
        assert_eq!(change.item_id(), "i-1");

        let change: ItemChange =
            serde_json::from_str(r#"{"action":"remove","item_id":"i-2"}"#).unwrap();
        assert_eq!(change.item_id(), "i-2");
    }

    #[test]
    fn test_item_input_defaults() {
        let input: OrderItemInput = serde_json::from_str(r#"{"product_id":"p-1"}"#).unwrap();
        assert_eq!(input.quantity, 1);
        assert!(input.addons.is_empty());
        assert!(input.size_id.is_none());
    }

    #[test]
    fn test_payment_amount_accepts_string_and_number() {
        let input: PaymentInput =
            serde_json::from_str(r#"{"method":"cash","amount":"12.50"}"#).unwrap();
        assert_eq!(input.amount, Decimal::new(1250, 2));
        let input: PaymentInput =
            serde_json::from_str(r#"{"method":"card","amount":8,"reference":"AP-1"}"#).unwrap();
        assert_eq!(input.amount, Decimal::from(8));
    }
}
