use thiserror::Error;

use crate::auth::JwtError;
use crate::orders::OrderError;

/// 服务器启动和运行错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(#[from] JwtError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("数据库初始化失败: {0}")]
    Storage(#[from] OrderError),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
