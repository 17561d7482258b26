//! Dining Table API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::TABLES_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    // 查看和改状态 (清台等)：登录员工即可
    let staff_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", post(handler::change_status));

    // 桌台同步：区域/桌台管理方推送
    let manage_routes = Router::new()
        .route("/{id}", put(handler::upsert))
        .layer(middleware::from_fn(require_permission(TABLES_MANAGE)));

    staff_routes.merge(manage_routes)
}
