//! Data models
//!
//! Shared between pos-server and terminals (via API).

pub mod dining_table;
pub mod product;

// Re-exports
pub use dining_table::*;
pub use product::*;
