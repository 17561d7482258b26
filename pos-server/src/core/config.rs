use std::path::PathBuf;

use crate::auth::{JwtConfig, JwtError};

/// 服务器配置 - 边缘节点的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | KITCHEN_POLL_INTERVAL_SECS | 10 | 厨房看板建议轮询间隔 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志文件目录，未设置时只输出到终端 |
/// | JWT_SECRET 等 | - | 见 [`JwtConfig::from_env`] |
///
/// ```ignore
/// WORK_DIR=/data/pos HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 厨房看板轮询间隔 (秒)，随每次轮询结果下发给客户端
    pub kitchen_poll_interval_secs: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Result<Self, JwtError> {
        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            jwt: JwtConfig::from_env()?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            kitchen_poll_interval_secs: env_or("KITCHEN_POLL_INTERVAL_SECS", 10),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        })
    }

    /// 测试配置：固定 JWT 密钥，指定工作目录
    pub fn for_tests(work_dir: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            jwt: JwtConfig::with_secret(jwt_secret),
            environment: "test".into(),
            request_timeout_ms: 30_000,
            kitchen_poll_interval_secs: 10,
            log_level: "info".into(),
            log_dir: None,
        }
    }

    /// 数据库文件路径: `<WORK_DIR>/orders.redb`
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_under_work_dir() {
        let config = Config::for_tests("/tmp/pos", "secret-secret-secret-secret-secret");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/pos/orders.redb")
        );
        assert!(!config.is_production());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("POS_SERVER_TEST_UNSET_VARIABLE", 7u64), 7);
    }
}
