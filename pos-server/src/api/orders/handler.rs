//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::order::{
    ItemChange, KitchenTransition, OrderItemInput, OrderSnapshot, OrderTransition, PaymentInput,
    PaymentRecord, StartOrder,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::pos::CheckoutReceipt;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct AppendItemsRequest {
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemsRequest {
    pub changes: Vec<ItemChange>,
}

/// POST /api/orders - 开单 (空明细创建草稿)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<StartOrder>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state.session().start_order(&scope, &user, payload)?;
    Ok(Json(order))
}

/// GET /api/orders/:id - 订单快照
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state.store().get(&scope, &id)?;
    Ok(Json(order))
}

/// POST /api/orders/:id/items - 加菜
pub async fn append_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AppendItemsRequest>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state
        .session()
        .append_items(&scope, &id, &payload.items, &user)?;
    Ok(Json(order))
}

/// PATCH /api/orders/:id/items - 改数量、备注或删除明细
pub async fn update_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateItemsRequest>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state
        .session()
        .update_items(&scope, &id, &payload.changes, &user)?;
    Ok(Json(order))
}

/// POST /api/orders/:id/kitchen-status - 厨房推进
pub async fn advance_kitchen(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<KitchenTransition>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state
        .state_machine()
        .apply_kitchen_transition(&scope, &id, payload, &user)?;
    Ok(Json(order))
}

/// POST /api/orders/:id/status - 取消、退款、标记已付
pub async fn change_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<OrderTransition>,
) -> AppResult<Json<OrderSnapshot>> {
    let scope = user.scope()?;
    let order = state
        .state_machine()
        .apply_order_transition(&scope, &id, payload, &user)?;
    Ok(Json(order))
}

/// POST /api/orders/:id/checkout - 结账
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PaymentInput>,
) -> AppResult<Json<CheckoutReceipt>> {
    let scope = user.scope()?;
    let receipt = state
        .session()
        .checkout(&scope, &id, payload, &user)
        .await?;
    Ok(Json(receipt))
}

/// GET /api/orders/:id/payments - 支付记录
pub async fn list_payments(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<PaymentRecord>>> {
    let scope = user.scope()?;
    let payments = state.store().list_payments(&scope, &id)?;
    Ok(Json(payments))
}
