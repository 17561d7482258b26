//! Kitchen Orders API Handlers

use axum::{Json, extract::State};
use shared::order::KitchenFeed;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/kitchen-orders - Active orders, oldest first
///
/// Displays re-poll after `poll_interval_secs`.
pub async fn poll(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<KitchenFeed>> {
    let scope = user.scope()?;
    let feed = state.kitchen().poll(&scope)?;
    Ok(Json(feed))
}
