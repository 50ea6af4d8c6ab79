//! redb-based storage layer for reservation event sourcing
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `reservation_events` | `(reservation_id, sequence)` | `ReservationEvent` | Event stream (append-only) |
//! | `reservation_snapshots` | `reservation_id` | `ReservationSnapshot` | Snapshot cache |
//! | `active_reservations` | `(account_id, team_member_id, reservation_id)` | `()` | Calendar index |
//! | `booking_counters` | `&str` | `u64` | Global sequence + daily ticket numbers |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), which keeps the file consistent through power
//! loss or forced restarts.

use chrono_tz::Tz;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::reservation::{ReservationEvent, ReservationSnapshot};
use std::sync::Arc;

use crate::db::{StorageError, StorageResult};

/// Events: key = (reservation_id, sequence), value = JSON ReservationEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> =
    TableDefinition::new("reservation_events");

/// Snapshots: key = reservation_id, value = JSON ReservationSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("reservation_snapshots");

/// Calendar index: key = (account_id, team_member_id, reservation_id)
const ACTIVE_TABLE: TableDefinition<(i64, i64, &str), ()> =
    TableDefinition::new("active_reservations");

/// Counters: key = "seq" | "ticket_number" | "ticket_date", value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("booking_counters");

const SEQUENCE_KEY: &str = "seq";
const TICKET_NUMBER_KEY: &str = "ticket_number";
const TICKET_DATE_KEY: &str = "ticket_date";

/// Reservation storage backed by redb
#[derive(Clone)]
pub struct ReservationStorage {
    db: Arc<Database>,
}

impl ReservationStorage {
    /// Attach to a shared database handle and ensure tables exist
    pub fn with_db(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(SEQUENCE_KEY)?.is_none() {
                counters.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// In-memory storage (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_db(crate::db::open_in_memory()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current global sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(SEQUENCE_KEY)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Current sequence within a write transaction
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(SEQUENCE_KEY)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Set sequence (within transaction), called after events are generated
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Ticket Numbers (叫号) ==========

    /// Next queue ticket number, e.g. `T-0612-041`.
    ///
    /// The counter resets daily (business timezone) with a random start so
    /// ticket numbers do not leak daily volume; wraps at 1000.
    pub fn next_ticket_number(&self, tz: Tz) -> StorageResult<String> {
        use rand::Rng;

        let now_local = chrono::Utc::now().with_timezone(&tz);
        let today: u64 = now_local.format("%Y%m%d").to_string().parse().unwrap_or(0);
        let label = now_local.format("%m%d").to_string();

        let txn = self.db.begin_write()?;
        let number = {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            let stored_date = table.get(TICKET_DATE_KEY)?.map(|g| g.value()).unwrap_or(0);

            if stored_date != today {
                // New day: random start 0-899
                let start: u64 = rand::thread_rng().gen_range(0..900);
                table.insert(TICKET_DATE_KEY, today)?;
                table.insert(TICKET_NUMBER_KEY, start + 1)?;
                start + 1
            } else {
                let current = table
                    .get(TICKET_NUMBER_KEY)?
                    .map(|g| g.value())
                    .unwrap_or(0);
                let next = (current + 1) % 1000;
                table.insert(TICKET_NUMBER_KEY, next)?;
                next
            }
        };
        txn.commit()?;

        Ok(format!("T-{}-{:03}", label, number))
    }

    // ========== Event Operations ==========

    /// Store an event (within transaction)
    pub fn store_event(
        &self,
        txn: &WriteTransaction,
        event: &ReservationEvent,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.reservation_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All events for one reservation, sequence order
    pub fn get_events_for_reservation(
        &self,
        reservation_id: &str,
    ) -> StorageResult<Vec<ReservationEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((reservation_id, 0u64)..=(reservation_id, u64::MAX))? {
            let (_key, value) = result?;
            events.push(serde_json::from_slice(value.value())?);
        }
        events.sort_by_key(|e: &ReservationEvent| e.sequence);
        Ok(events)
    }

    /// Events since a given sequence (across all reservations)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<ReservationEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: ReservationEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot and keep the calendar index in sync (within
    /// transaction)
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &ReservationSnapshot,
    ) -> StorageResult<()> {
        {
            let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
            let value = serde_json::to_vec(snapshot)?;
            table.insert(snapshot.reservation_id.as_str(), value.as_slice())?;
        }

        let mut active = txn.open_table(ACTIVE_TABLE)?;
        let key = (
            snapshot.account_id,
            snapshot.team_member_id,
            snapshot.reservation_id.as_str(),
        );
        if snapshot.is_active() {
            active.insert(key, ())?;
        } else {
            active.remove(key)?;
        }
        Ok(())
    }

    /// Remove a stale calendar-index entry (when a reservation moves between
    /// resources during reschedule)
    pub fn remove_active_entry(
        &self,
        txn: &WriteTransaction,
        account_id: i64,
        team_member_id: i64,
        reservation_id: &str,
    ) -> StorageResult<()> {
        let mut active = txn.open_table(ACTIVE_TABLE)?;
        active.remove((account_id, team_member_id, reservation_id))?;
        Ok(())
    }

    /// Get a snapshot by reservation ID
    pub fn get_snapshot(&self, reservation_id: &str) -> StorageResult<Option<ReservationSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(reservation_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a snapshot by reservation ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        reservation_id: &str,
    ) -> StorageResult<Option<ReservationSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(reservation_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Calendar Index ==========

    /// Active reservations for one resource (within transaction, for
    /// conflict checks under the resource lock)
    pub fn get_active_for_resource_txn(
        &self,
        txn: &WriteTransaction,
        account_id: i64,
        team_member_id: i64,
    ) -> StorageResult<Vec<ReservationSnapshot>> {
        let active = txn.open_table(ACTIVE_TABLE)?;
        let snapshots = txn.open_table(SNAPSHOTS_TABLE)?;

        let mut result = Vec::new();
        let range = (account_id, team_member_id, "")..(account_id, team_member_id, "\u{10FFFF}");
        for entry in active.range(range)? {
            let (key, _) = entry?;
            let reservation_id = key.value().2.to_string();
            if let Some(value) = snapshots.get(reservation_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Active reservations for one resource (read-only)
    pub fn get_active_for_resource(
        &self,
        account_id: i64,
        team_member_id: i64,
    ) -> StorageResult<Vec<ReservationSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut result = Vec::new();
        let range = (account_id, team_member_id, "")..(account_id, team_member_id, "\u{10FFFF}");
        for entry in active.range(range)? {
            let (key, _) = entry?;
            let reservation_id = key.value().2.to_string();
            if let Some(value) = snapshots.get(reservation_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Active reservations for a whole account (within transaction, for
    /// queue dispatch under the lane lock)
    pub fn get_active_for_account_txn(
        &self,
        txn: &WriteTransaction,
        account_id: i64,
    ) -> StorageResult<Vec<ReservationSnapshot>> {
        let active = txn.open_table(ACTIVE_TABLE)?;
        let snapshots = txn.open_table(SNAPSHOTS_TABLE)?;

        let mut result = Vec::new();
        let range = (account_id, i64::MIN, "")..(account_id, i64::MAX, "\u{10FFFF}");
        for entry in active.range(range)? {
            let (key, _) = entry?;
            let reservation_id = key.value().2.to_string();
            if let Some(value) = snapshots.get(reservation_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Active reservations for a whole account
    pub fn get_active_for_account(
        &self,
        account_id: i64,
    ) -> StorageResult<Vec<ReservationSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut result = Vec::new();
        let range = (account_id, i64::MIN, "")..(account_id, i64::MAX, "\u{10FFFF}");
        for entry in active.range(range)? {
            let (key, _) = entry?;
            let reservation_id = key.value().2.to_string();
            if let Some(value) = snapshots.get(reservation_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    /// Active reservations across every account (sweep scan)
    pub fn get_all_active(&self) -> StorageResult<Vec<ReservationSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut result = Vec::new();
        for entry in active.iter()? {
            let (key, _) = entry?;
            let reservation_id = key.value().2.to_string();
            if let Some(value) = snapshots.get(reservation_id.as_str())? {
                result.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(result)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        let events = read_txn.open_table(EVENTS_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let counters = read_txn.open_table(COUNTERS_TABLE)?;

        Ok(StorageStats {
            event_count: events.len()?,
            snapshot_count: snapshots.len()?,
            active_count: active.len()?,
            current_sequence: counters.get(SEQUENCE_KEY)?.map(|g| g.value()).unwrap_or(0),
        })
    }

    /// Load a snapshot or fail with ReservationNotFound
    pub fn require_snapshot(&self, reservation_id: &str) -> StorageResult<ReservationSnapshot> {
        self.get_snapshot(reservation_id)?
            .ok_or_else(|| StorageError::ReservationNotFound(reservation_id.to_string()))
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub event_count: u64,
    pub snapshot_count: u64,
    pub active_count: u64,
    pub current_sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::reservation::{
        Actor, EventPayload, ReservationEventType, ReservationStatus,
    };

    fn test_event(reservation_id: &str, sequence: u64) -> ReservationEvent {
        ReservationEvent::new(
            sequence,
            reservation_id.to_string(),
            &Actor::staff(1, "Test Operator"),
            shared::util::now_millis(),
            ReservationEventType::Confirmed,
            EventPayload::Confirmed {},
        )
    }

    fn test_snapshot(reservation_id: &str, account_id: i64, member: i64) -> ReservationSnapshot {
        let mut snapshot = ReservationSnapshot::new(reservation_id.to_string());
        snapshot.account_id = account_id;
        snapshot.team_member_id = member;
        snapshot.status = ReservationStatus::Confirmed;
        snapshot
    }

    #[test]
    fn test_sequence_operations() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_current_sequence().unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        storage.set_sequence(&txn, 5).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_current_sequence().unwrap(), 5);
    }

    #[test]
    fn test_event_storage() {
        let storage = ReservationStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &test_event("r-1", 1)).unwrap();
        storage.store_event(&txn, &test_event("r-1", 2)).unwrap();
        storage.store_event(&txn, &test_event("r-2", 3)).unwrap();
        txn.commit().unwrap();

        let events = storage.get_events_for_reservation("r-1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);

        let since = storage.get_events_since(1).unwrap();
        assert_eq!(since.len(), 2);
        assert!(since.iter().all(|e| e.sequence > 1));
    }

    #[test]
    fn test_snapshot_maintains_calendar_index() {
        let storage = ReservationStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-1", 1, 7)).unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-2", 1, 7)).unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-3", 1, 8)).unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-4", 2, 7)).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_active_for_resource(1, 7).unwrap().len(), 2);
        assert_eq!(storage.get_active_for_resource(1, 8).unwrap().len(), 1);
        assert_eq!(storage.get_active_for_account(1).unwrap().len(), 3);
        assert_eq!(storage.get_all_active().unwrap().len(), 4);

        // Terminal status drops out of the index but keeps the snapshot
        let mut done = test_snapshot("r-1", 1, 7);
        done.status = ReservationStatus::Completed;
        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &done).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_active_for_resource(1, 7).unwrap().len(), 1);
        assert!(storage.get_snapshot("r-1").unwrap().is_some());
    }

    #[test]
    fn test_active_read_within_txn() {
        let storage = ReservationStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-1", 1, 7)).unwrap();
        let active = storage.get_active_for_resource_txn(&txn, 1, 7).unwrap();
        assert_eq!(active.len(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_require_snapshot() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        assert!(matches!(
            storage.require_snapshot("missing"),
            Err(StorageError::ReservationNotFound(_))
        ));
    }

    #[test]
    fn test_ticket_number_format() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let first = storage.next_ticket_number(chrono_tz::UTC).unwrap();
        let second = storage.next_ticket_number(chrono_tz::UTC).unwrap();

        assert!(first.starts_with("T-"));
        assert_eq!(first.len(), "T-0612-041".len());
        assert_ne!(first, second);
    }

    #[test]
    fn test_stats() {
        let storage = ReservationStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.store_event(&txn, &test_event("r-1", 1)).unwrap();
        storage.store_snapshot(&txn, &test_snapshot("r-1", 1, 7)).unwrap();
        storage.set_sequence(&txn, 1).unwrap();
        txn.commit().unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.event_count, 1);
        assert_eq!(stats.snapshot_count, 1);
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.current_sequence, 1);
    }
}
