//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{DiningTable, DiningTableUpsert, TableStatusChange};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Maximum length of a table name
const MAX_NAME_LEN: usize = 50;

/// GET /api/tables - 获取所有桌台
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<DiningTable>>> {
    let scope = user.scope()?;
    let tables = state.store().list_tables(&scope)?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    let scope = user.scope()?;
    let table = state.store().get_table(&scope, &id)?;
    Ok(Json(table))
}

/// PUT /api/tables/:id - 同步桌台 (新建或更新)
pub async fn upsert(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DiningTableUpsert>,
) -> AppResult<Json<DiningTable>> {
    let scope = user.scope()?;
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "table name must be 1 to {} characters",
            MAX_NAME_LEN
        )));
    }
    if payload.capacity == 0 {
        return Err(AppError::validation("table capacity must be positive"));
    }
    let table = state.store().upsert_table(&scope, &id, payload)?;
    Ok(Json(table))
}

/// POST /api/tables/:id/status - 条件修改桌台状态
pub async fn change_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<TableStatusChange>,
) -> AppResult<Json<DiningTable>> {
    let scope = user.scope()?;
    let table = state
        .store()
        .set_table_status(&scope, &id, payload.expected, payload.target)?;
    tracing::info!(table_id = %id, actor = %user.id, to = %payload.target, "Table status set by staff");
    Ok(Json(table))
}
