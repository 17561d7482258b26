use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::kitchen::KitchenFeedService;
use crate::orders::{OrderStateMachine, OrderStore};
use crate::pos::{PaymentProcessor, PosSession, TenderPaymentProcessor};
use crate::services::CatalogService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有字段都是浅拷贝 (内部 Arc)，每个请求克隆一份的成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | OrderStore | 订单存储 (redb) |
/// | state_machine | OrderStateMachine | 状态流转唯一入口 |
/// | catalog | CatalogService | 产品目录 (内存缓存) |
/// | session | PosSession | 收银流程 |
/// | kitchen | KitchenFeedService | 厨房看板轮询 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
///
/// # 使用示例
///
/// ```ignore
/// let scope = user.scope()?;
/// let order = state.store().get(&scope, &order_id)?;
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 订单存储
    pub store: OrderStore,
    /// 状态机
    pub state_machine: OrderStateMachine,
    /// 产品目录
    pub catalog: CatalogService,
    /// 收银流程
    pub session: PosSession,
    /// 厨房看板
    pub kitchen: KitchenFeedService,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 用已打开的存储组装服务器状态
    ///
    /// 通常使用 [`initialize()`](Self::initialize) 方法代替
    pub fn new(config: Config, store: OrderStore, processor: Arc<dyn PaymentProcessor>) -> Self {
        let state_machine = OrderStateMachine::new(store.clone());
        let catalog = CatalogService::new(store.clone());
        let session = PosSession::new(
            store.clone(),
            state_machine.clone(),
            catalog.clone(),
            processor,
        );
        let kitchen = KitchenFeedService::new(store.clone(), config.kitchen_poll_interval_secs);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            store,
            state_machine,
            catalog,
            session,
            kitchen,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 数据库 (work_dir/orders.redb)
    /// 3. 各服务，产品目录缓存预热
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;

        let db_path = config.database_path();
        let store = OrderStore::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Order store opened");

        let state = Self::new(config.clone(), store, Arc::new(TenderPaymentProcessor));
        state.catalog.warmup()?;
        Ok(state)
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn state_machine(&self) -> &OrderStateMachine {
        &self.state_machine
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn session(&self) -> &PosSession {
        &self.session
    }

    pub fn kitchen(&self) -> &KitchenFeedService {
        &self.kitchen
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
