//! Embedded database bootstrap (redb)
//!
//! One redb database file per server instance; each subsystem
//! ([`crate::reservations::storage`], [`crate::settings::store`]) opens its
//! own tables on the shared handle.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: copy-on-write with
//! an atomic pointer swap, so the file stays consistent through power loss.

use redb::Database;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors shared by every redb-backed store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Open or create the database at the given path
pub fn open(path: impl AsRef<Path>) -> StorageResult<Arc<Database>> {
    Ok(Arc::new(Database::create(path)?))
}

/// Open an in-memory database (for testing)
pub fn open_in_memory() -> StorageResult<Arc<Database>> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    Ok(Arc::new(db))
}
