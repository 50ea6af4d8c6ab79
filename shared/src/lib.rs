//! Shared types for the booking engine
//!
//! Common types used by the engine crate and by in-process consumers:
//! reservation domain types (snapshots, events), scheduling settings,
//! availability windows, unified error codes, and small time/id utilities.

pub mod error;
pub mod models;
pub mod reservation;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Error re-exports (for convenient access)
pub use error::{ErrorBody, ErrorCategory, ErrorCode};

// Domain re-exports
pub use reservation::{
    Actor, ActorRole, QueueTicket, QueueTier, ReservationEvent, ReservationEventType,
    ReservationSnapshot, ReservationSource, ReservationStatus,
};
