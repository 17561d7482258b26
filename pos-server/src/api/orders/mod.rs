//! Order API Module
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | /api/orders | start order |
//! | GET | /api/orders/{id} | order snapshot |
//! | POST | /api/orders/{id}/items | append items |
//! | PATCH | /api/orders/{id}/items | update items |
//! | POST | /api/orders/{id}/kitchen-status | advance kitchen status |
//! | POST | /api/orders/{id}/status | order status change |
//! | POST | /api/orders/{id}/checkout | pay and close |
//! | GET | /api/orders/{id}/payments | payment attempts |
//!
//! Capabilities are checked by the session and state machine, which know
//! the order being changed.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route(
            "/{id}/items",
            post(handler::append_items).patch(handler::update_items),
        )
        .route("/{id}/kitchen-status", post(handler::advance_kitchen))
        .route("/{id}/status", post(handler::change_status))
        .route("/{id}/checkout", post(handler::checkout))
        .route("/{id}/payments", get(handler::list_payments))
}
