//! Live Queue Module
//!
//! Walk-in/appointment dispatch for accounts with queue mode enabled:
//!
//! - **dispatcher**: lanes, tier + FIFO ordering, ticket issuance,
//!   call-next, check-in, the staff board
//! - **sweeper**: periodic grace-expiry and late-release sweep
//!
//! The lane lock (team member 0 of the account) serializes every dispatch
//! mutation, so two staff devices can never call the same ticket twice.

pub mod dispatcher;
pub mod sweeper;

pub use dispatcher::{CallOutcome, QueueBoard, QueueService, WalkInRequest};
pub use sweeper::{GraceSweeper, SweepReport};
