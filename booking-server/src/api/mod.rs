//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`settings`] - 预约设置接口 (resolved settings + overrides)
//! - [`slots`] - 可预约时段查询
//! - [`reservations`] - 预约生命周期接口
//! - [`queue`] - 现场队列接口 (叫号)

pub mod convert;

pub mod health;
pub mod queue;
pub mod reservations;
pub mod settings;
pub mod slots;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Assemble the full API router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(settings::router())
        .merge(slots::router())
        .merge(reservations::router())
        .merge(queue::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
