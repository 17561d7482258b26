//! Catalog API 模块
//!
//! 库存/菜单管理方推送的产品记录。

mod handler;

use axum::{Router, middleware, routing::get, routing::put};

use crate::auth::permissions::MENU_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/catalog/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list));

    let manage_routes = Router::new()
        .route("/{id}", put(handler::upsert).delete(handler::deactivate))
        .layer(middleware::from_fn(require_permission(MENU_MANAGE)));

    read_routes.merge(manage_routes)
}
