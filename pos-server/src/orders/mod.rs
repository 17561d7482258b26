//! Order workflow module
//!
//! - **storage**: redb persistence for orders, tables, payments and catalog records
//! - **state_machine**: the single authority for order and kitchen status changes
//! - **money**: line pricing and totals with rust_decimal
//! - **error**: domain error taxonomy and its wire mapping
//!
//! # Data Flow
//!
//! ```text
//! Terminal → API handler → PosSession / OrderStateMachine → OrderStore (redb)
//!                                                              ↓ commit
//!                                                      broadcast OrderChange
//! ```

pub mod error;
pub mod money;
pub mod state_machine;
pub mod storage;

// Re-exports
pub use error::{Entity, OrderError, OrderResult};
pub use state_machine::OrderStateMachine;
pub use storage::{NewOrder, OrderStore, PaymentResolution, StorageError, StorageStats};
