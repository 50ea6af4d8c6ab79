//! Operation implementations
//!
//! Each action validates one operation against the current stored state and
//! returns the events to persist. Actions never write: the manager applies
//! and persists events in a single transaction.

use redb::WriteTransaction;
use shared::reservation::ReservationSnapshot;

use super::error::{EngineError, EngineResult};
use super::storage::ReservationStorage;

mod book;
mod cancel;
mod status;

pub use book::BookAction;
pub use cancel::{CancelAction, ClientGate};
pub use status::{CompleteAction, ConfirmAction, NoShowAction, StartServiceAction};

/// Context handed to actions: transactional reads plus sequence allocation
pub struct ActionContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a ReservationStorage,
    sequence: u64,
    /// Evaluation instant (Unix millis), injected for determinism
    pub now: i64,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a ReservationStorage,
        current_sequence: u64,
        now: i64,
    ) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            now,
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence allocated so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Load a snapshot within the transaction
    pub fn load_snapshot(&self, reservation_id: &str) -> EngineResult<ReservationSnapshot> {
        self.storage
            .get_snapshot_txn(self.txn, reservation_id)?
            .ok_or_else(|| EngineError::ReservationNotFound(reservation_id.to_string()))
    }

    /// Active reservations on a resource, read within the transaction so the
    /// check-then-write sequence stays consistent under the resource lock
    pub fn active_for_resource(
        &self,
        account_id: i64,
        team_member_id: i64,
    ) -> EngineResult<Vec<ReservationSnapshot>> {
        Ok(self
            .storage
            .get_active_for_resource_txn(self.txn, account_id, team_member_id)?)
    }

    /// Active reservations for a whole account (queue dispatch under the
    /// lane lock)
    pub fn active_for_account(&self, account_id: i64) -> EngineResult<Vec<ReservationSnapshot>> {
        Ok(self
            .storage
            .get_active_for_account_txn(self.txn, account_id)?)
    }
}
