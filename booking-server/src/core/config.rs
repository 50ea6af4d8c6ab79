//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/booking | 工作目录 (数据库、日志) |
//! | HTTP_PORT | 3000 | HTTP 服务端口 |
//! | ENVIRONMENT | development | 运行环境 |
//! | LOCK_WAIT_MS | 5000 | 资源锁等待上限 (毫秒) |
//! | SWEEP_INTERVAL_SECS | 30 | 宽限期扫描间隔 (秒) |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | (无) | 日志文件目录，未设置则只输出到终端 |
//!
//! # 示例
//!
//! ```ignore
//! WORK_DIR=/data/booking HTTP_PORT=8080 cargo run
//! ```

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储 redb 数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 资源锁等待上限 (毫秒)
    pub lock_wait_ms: u64,
    /// 宽限期/迟到释放扫描间隔 (秒)
    pub sweep_interval_secs: u64,
    /// 日志级别
    pub log_level: String,
    /// 日志文件目录 (可选)
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置，未设置时使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/booking".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            lock_wait_ms: std::env::var("LOCK_WAIT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// 使用自定义值覆盖部分配置，常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("booking.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides("/tmp/test-booking", 8080);
        assert_eq!(config.work_dir, "/tmp/test-booking");
        assert_eq!(config.http_port, 8080);
        assert!(config.database_path().ends_with("booking.redb"));
    }
}
