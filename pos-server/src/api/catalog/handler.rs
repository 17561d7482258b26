//! Catalog API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{CatalogProduct, CatalogProductUpsert};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/catalog/products - 当前餐厅的产品
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<CatalogProduct>>> {
    let scope = user.scope()?;
    Ok(Json(state.catalog().list_products(&scope)))
}

/// PUT /api/catalog/products/:id - 新建或替换产品
pub async fn upsert(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CatalogProductUpsert>,
) -> AppResult<Json<CatalogProduct>> {
    let scope = user.scope()?;
    let product = state.catalog().upsert(&scope, &id, payload)?;
    Ok(Json(product))
}

/// DELETE /api/catalog/products/:id - 下架 (已有订单明细不受影响)
pub async fn deactivate(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<CatalogProduct>> {
    let scope = user.scope()?;
    let product = state.catalog().deactivate(&scope, &id)?;
    Ok(Json(product))
}
