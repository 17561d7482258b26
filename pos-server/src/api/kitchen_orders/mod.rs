//! Kitchen Orders API Module
//!
//! Polling endpoint for kitchen displays.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/kitchen-orders", get(handler::poll))
}
