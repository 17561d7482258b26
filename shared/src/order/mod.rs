//! Order lifecycle types
//!
//! - Statuses: order status and kitchen status, two independent dimensions
//! - Snapshots: persisted order state with its lines
//! - Changes: notifications published after each committed write

pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::{OrderChange, OrderChangeKind};
pub use snapshot::{KitchenFeed, OrderSnapshot, format_order_number};
pub use types::*;
