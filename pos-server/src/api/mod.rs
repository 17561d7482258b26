//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公共)
//! - [`orders`] - 订单、明细、状态流转、结账
//! - [`kitchen_orders`] - 厨房看板轮询
//! - [`tables`] - 桌台同步与状态
//! - [`catalog`] - 产品目录同步

pub mod catalog;
pub mod health;
pub mod kitchen_orders;
pub mod orders;
pub mod tables;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
