//! POS Server - 餐厅点单与厨房流程边缘服务
//!
//! # 架构概述
//!
//! 多个收银/点单终端和厨房看板共享同一个订单存储，
//! 一致性由数据层的条件写入 (乐观并发) 保证：
//!
//! - **订单** (`orders`): redb 存储、状态机、金额计算
//! - **收银** (`pos`): 开单、加菜、结账、支付处理接口
//! - **厨房** (`kitchen`): 无状态轮询看板
//! - **认证** (`auth`): JWT + 角色权限
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 认证、权限
//! ├── orders/        # 订单存储与状态机
//! ├── pos/           # 收银流程
//! ├── kitchen/       # 厨房看板
//! ├── services/      # 产品目录
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、错误重导出
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod kitchen;
pub mod orders;
pub mod pos;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, RestaurantScope, Server, ServerState, build_app};
pub use orders::{OrderError, OrderStateMachine, OrderStore};
pub use pos::{PaymentProcessor, PosSession};

// Re-export unified error types from shared
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境
///
/// 1. 加载 `.env` (如存在)
/// 2. 读取配置
/// 3. 初始化日志
pub fn setup_environment() -> core::Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  ____  _____
   / __ \/ __ \/ ___/
  / /_/ / / / /\__ \
 / ____/ /_/ /___/ /
/_/    \____//____/   order & kitchen server
    "#
    );
}
