//! Order change notifications, published after each committed write

use super::snapshot::OrderSnapshot;
use serde::{Deserialize, Serialize};

/// What changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderChangeKind {
    Created,
    ItemsChanged,
    KitchenStatusChanged,
    StatusChanged,
}

impl std::fmt::Display for OrderChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderChangeKind::Created => write!(f, "CREATED"),
            OrderChangeKind::ItemsChanged => write!(f, "ITEMS_CHANGED"),
            OrderChangeKind::KitchenStatusChanged => write!(f, "KITCHEN_STATUS_CHANGED"),
            OrderChangeKind::StatusChanged => write!(f, "STATUS_CHANGED"),
        }
    }
}

/// Committed change with the resulting snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderChange {
    pub order_id: String,
    pub restaurant_id: String,
    pub kind: OrderChangeKind,
    pub snapshot: OrderSnapshot,
}

impl OrderChange {
    pub fn new(kind: OrderChangeKind, snapshot: OrderSnapshot) -> Self {
        Self {
            order_id: snapshot.order_id.clone(),
            restaurant_id: snapshot.restaurant_id.clone(),
            kind,
            snapshot,
        }
    }
}
