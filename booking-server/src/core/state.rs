//! 服务器状态 - 持有所有服务的共享引用
//!
//! ServerState 是引擎进程的核心数据结构。
//! 使用 Arc 实现浅拷贝，所有权成本极低。
//!
//! # 服务组件
//!
//! | 字段 | 类型 | 说明 |
//! |------|------|------|
//! | config | Config | 配置项 (不可变) |
//! | manager | Arc<ReservationsManager> | 预约引擎 |
//! | queue | QueueService | 现场队列调度 |

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, Result};
use crate::db;
use crate::queue::{GraceSweeper, QueueService};
use crate::reservations::{ReservationStorage, ReservationsManager, ResourceLocks};
use crate::settings::{SettingsService, SettingsStore};

/// Server state - shared handles to every service
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 预约引擎
    pub manager: Arc<ReservationsManager>,
    /// 现场队列调度
    pub queue: QueueService,
}

impl ServerState {
    /// 初始化服务器状态：打开数据库、装配各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let database = db::open(config.database_path())?;

        let settings_store = SettingsStore::with_db(database.clone())?;
        let settings = SettingsService::new(settings_store);
        let storage = ReservationStorage::with_db(database)?;

        let locks = Arc::new(ResourceLocks::new(Duration::from_millis(
            config.lock_wait_ms,
        )));
        let manager = Arc::new(ReservationsManager::with_locks(storage, settings, locks));
        let queue = QueueService::new(manager.clone());

        tracing::info!(work_dir = %config.work_dir, "Server state initialized");

        Ok(Self {
            config: config.clone(),
            manager,
            queue,
        })
    }

    /// 获取设置服务
    pub fn settings(&self) -> &SettingsService {
        self.manager.settings()
    }

    /// 启动后台任务，返回用于优雅关闭的取消令牌
    pub fn start_background_tasks(&self) -> CancellationToken {
        let shutdown = CancellationToken::new();

        let sweeper = GraceSweeper::new(
            self.manager.clone(),
            Duration::from_secs(self.config.sweep_interval_secs),
            shutdown.clone(),
        );
        tokio::spawn(sweeper.run());

        shutdown
    }
}
