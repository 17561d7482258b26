//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/health | GET | 存活检查 + 数据库检查 | 无 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "database": { "status": "ok", "latency_ms": 0 },
//!   "stats": { "order_count": 12, "kitchen_active_count": 3, "table_count": 8, "payment_count": 9 }
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::Instant;

use crate::core::ServerState;
use crate::orders::StorageStats;

/// 健康检查路由 - 公共路由 (无需认证)
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | degraded)
    status: &'static str,
    /// 版本号
    version: &'static str,
    /// 数据库检查
    database: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StorageStats>,
}

/// 单项检查结果
#[derive(Serialize)]
pub struct CheckResult {
    /// 状态 (ok | error)
    status: &'static str,
    /// 延迟 (毫秒)
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /api/health
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let start = Instant::now();
    let result = state.store().get_stats();
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, database, stats) = match result {
        Ok(stats) => (
            "ok",
            CheckResult {
                status: "ok",
                latency_ms,
                error: None,
            },
            Some(stats),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check: order store unavailable");
            (
                "degraded",
                CheckResult {
                    status: "error",
                    latency_ms,
                    error: Some(e.to_string()),
                },
                None,
            )
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        stats,
    })
}
