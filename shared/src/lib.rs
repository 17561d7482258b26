//! Shared types for the restaurant POS edge server
//!
//! Common types used by the server and its terminals: order lifecycle
//! types, catalog and table models, the unified error system.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
