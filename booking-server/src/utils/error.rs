//! 统一错误处理
//!
//! HTTP 层错误类型：把引擎错误映射为 `{code, message}` 响应体。
//!
//! # 错误码规范
//!
//! | 区间 | 分类 | HTTP |
//! |------|------|------|
//! | 1xxx | 校验错误 | 422 |
//! | 2xxx | 权限错误 | 403 |
//! | 4xxx | 预约错误 | 404/409/422 |
//! | 5xxx | 队列错误 | 404/409/422 |
//! | 9xxx | 系统错误 | 500 |

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use shared::error::{ErrorBody, ErrorCode};

use crate::reservations::EngineError;

/// Application-level Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// HTTP-facing application error
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    /// Create an error with the default message for the code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create an error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();
        if status.is_server_error() {
            tracing::error!(code = self.code.code(), message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = self.code.code(), message = %self.message, "Request rejected");
        }
        let body = ErrorBody::with_message(self.code, self.message);
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let code = err.code();
        Self {
            code,
            message: err.to_string(),
        }
    }
}
