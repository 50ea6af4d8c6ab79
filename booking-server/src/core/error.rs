//! Server startup/runtime errors

use crate::db::StorageError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors surfaced by server bootstrap and shutdown
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
