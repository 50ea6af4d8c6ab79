//! Booking Server - 多租户预约调度与现场队列引擎
//!
//! # 架构概述
//!
//! 本模块是预约引擎的主入口，提供以下核心功能：
//!
//! - **设置解析** (`settings`): 预设/账户/员工三级配置解析与缓存
//! - **时段计算** (`scheduling`): 可预约时段网格、缓冲冲突检查
//! - **预约引擎** (`reservations`): 事件溯源的预约生命周期
//! - **现场队列** (`queue`): 叫号调度与宽限期扫描
//! - **HTTP API** (`api`): RESTful 边界接口
//!
//! # 模块结构
//!
//! ```text
//! booking-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── settings/      # 设置解析 (presets, store, cache, resolver)
//! ├── scheduling/    # 纯调度逻辑 (availability, slots)
//! ├── reservations/  # 预约事件溯源 (actions, reducer, storage, locks)
//! ├── queue/         # 队列调度与扫描
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 错误、日志、时间工具
//! └── db.rs          # redb 引导
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod queue;
pub mod reservations;
pub mod scheduling;
pub mod settings;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use queue::{GraceSweeper, QueueService};
pub use reservations::{BookingRequest, EngineError, ReservationStorage, ReservationsManager};
pub use settings::SettingsService;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment(config: &Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ____              __   _
   / __ )____  ____  / /__(_)___  ____ _
  / __  / __ \/ __ \/ //_/ / __ \/ __ `/
 / /_/ / /_/ / /_/ / ,< / / / / / /_/ /
/_____/\____/\____/_/|_/_/_/ /_/\__, /
                               /____/
    "#
    );
}
