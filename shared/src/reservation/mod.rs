//! Reservation domain types
//!
//! - **types**: status/source/actor enums, payment policy, queue tier
//! - **snapshot**: computed reservation state, including the queue ticket
//! - **event**: immutable audit records emitted by the engine

pub mod event;
pub mod snapshot;
pub mod types;

pub use event::{EventPayload, ReservationEvent, ReservationEventType};
pub use snapshot::{QueueTicket, ReservationSnapshot};
pub use types::{Actor, ActorRole, PaymentPolicy, QueueTier, ReservationSource, ReservationStatus};
