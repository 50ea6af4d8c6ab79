//! redb-backed settings storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `settings_overrides` | `(account_id, team_member_id)` | `SettingsOverride` | Sparse override rows (0 = account level) |
//! | `account_profiles` | `account_id` | `AccountProfile` | Sector + business timezone |
//! | `availability` | `(account_id, team_member_id)` | `AvailabilityRow` | Weekly windows + exceptions |

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::availability::AvailabilityRow;
use shared::models::settings::{AccountProfile, SettingsOverride};
use std::sync::Arc;

use crate::db::StorageResult;

/// Override rows: key = (account_id, team_member_id) with 0 = account level
const SETTINGS_TABLE: TableDefinition<(i64, i64), &[u8]> =
    TableDefinition::new("settings_overrides");

/// Account profiles: key = account_id
const PROFILES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("account_profiles");

/// Availability rows: key = (account_id, team_member_id)
const AVAILABILITY_TABLE: TableDefinition<(i64, i64), &[u8]> =
    TableDefinition::new("availability");

/// Settings storage backed by redb
#[derive(Clone)]
pub struct SettingsStore {
    db: Arc<Database>,
}

impl SettingsStore {
    /// Attach to a shared database handle and ensure tables exist
    pub fn with_db(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
            let _ = write_txn.open_table(PROFILES_TABLE)?;
            let _ = write_txn.open_table(AVAILABILITY_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// In-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_db(crate::db::open_in_memory()?)
    }

    fn member_key(team_member_id: Option<i64>) -> i64 {
        team_member_id.unwrap_or(0)
    }

    // ========== Override Rows ==========

    /// Upsert an override row (keyed by its account/team-member pair)
    pub fn upsert_override(&self, row: &SettingsOverride) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            let key = (row.account_id, Self::member_key(row.team_member_id));
            let value = serde_json::to_vec(row)?;
            table.insert(key, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get an override row; `None` team member means the account-level row
    pub fn get_override(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> StorageResult<Option<SettingsOverride>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;
        match table.get((account_id, Self::member_key(team_member_id)))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove an override row (reverts that level to inherited values)
    pub fn remove_override(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS_TABLE)?;
            table
                .remove((account_id, Self::member_key(team_member_id)))?
                .is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    /// All override rows for an account (account-level row first)
    pub fn list_overrides(&self, account_id: i64) -> StorageResult<Vec<SettingsOverride>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        let mut rows = Vec::new();
        for result in table.range((account_id, 0)..=(account_id, i64::MAX))? {
            let (_key, value) = result?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Account Profiles ==========

    pub fn upsert_profile(&self, profile: &AccountProfile) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PROFILES_TABLE)?;
            let value = serde_json::to_vec(profile)?;
            table.insert(profile.account_id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_profile(&self, account_id: i64) -> StorageResult<Option<AccountProfile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROFILES_TABLE)?;
        match table.get(account_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Availability ==========

    pub fn upsert_availability(&self, row: &AvailabilityRow) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(AVAILABILITY_TABLE)?;
            let key = (row.account_id, row.team_member_id);
            let value = serde_json::to_vec(row)?;
            table.insert(key, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_availability(
        &self,
        account_id: i64,
        team_member_id: i64,
    ) -> StorageResult<Option<AvailabilityRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AVAILABILITY_TABLE)?;
        match table.get((account_id, team_member_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}
