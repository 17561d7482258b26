//! 统一错误处理
//!
//! 错误类型统一定义在 `shared::error`，这里仅做重导出，
//! 领域错误 (`OrderError`) 通过 `From` 转换为 [`AppError`]。
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::not_found("Order o-1"))
//!
//! // 领域错误自动转换
//! let order = state.store().get(&scope, &id)?;
//! ```

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
