//! Settings resolver
//!
//! `resolve(account_id, team_member_id?)` derives the effective settings:
//! team-member override wins over the account row, which wins over the
//! preset defaults — per field, not per row. Team rows carry only the
//! scheduling fields; queue and payment knobs are account-wide.

use chrono_tz::Tz;
use shared::models::settings::{
    AccountProfile, BusinessPreset, QueueAssignmentMode, QueueDispatchMode, ReservationSettings,
    SettingsOverride,
};
use std::sync::Arc;

use super::cache::SettingsCache;
use super::presets;
use super::store::SettingsStore;
use crate::db::StorageResult;
use crate::utils::time::parse_tz;

/// Settings resolution service: store + cache + preset defaults
#[derive(Clone)]
pub struct SettingsService {
    store: SettingsStore,
    cache: Arc<SettingsCache>,
}

impl SettingsService {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            cache: Arc::new(SettingsCache::new()),
        }
    }

    /// In-memory service (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Self {
        Self::new(SettingsStore::open_in_memory().unwrap())
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Resolve the effective settings for an (account, team-member) pair.
    ///
    /// Always returns a fully-populated value; absent rows fall through to
    /// the preset defaults exhaustively.
    pub fn resolve(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> StorageResult<ReservationSettings> {
        if let Some(cached) = self.cache.get(account_id, team_member_id) {
            return Ok(cached);
        }

        let resolved = self.resolve_uncached(account_id, team_member_id)?;
        self.cache
            .insert(account_id, team_member_id, resolved.clone());
        Ok(resolved)
    }

    fn resolve_uncached(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> StorageResult<ReservationSettings> {
        let profile = self.store.get_profile(account_id)?;
        let account_row = self.store.get_override(account_id, None)?;
        let team_row = match team_member_id {
            Some(id) => self.store.get_override(account_id, Some(id))?,
            None => None,
        };

        // Stored account-level preset wins over the sector mapping
        let stored_preset = account_row
            .as_ref()
            .and_then(|row| row.business_preset.as_deref())
            .filter(|value| !value.trim().is_empty());
        let preset = match stored_preset {
            Some(value) => BusinessPreset::parse_lenient(value),
            None => BusinessPreset::from_sector(
                profile.as_ref().and_then(|p| p.company_sector.as_deref()),
            ),
        };
        let defaults = presets::defaults(preset);

        let team = team_row.as_ref();
        let account = account_row.as_ref();

        let settings = ReservationSettings {
            business_preset: preset,

            // Scheduling fields: team → account → preset
            buffer_minutes: team
                .and_then(|r| r.buffer_minutes)
                .or(account.and_then(|r| r.buffer_minutes))
                .unwrap_or(defaults.buffer_minutes),
            slot_interval_minutes: team
                .and_then(|r| r.slot_interval_minutes)
                .or(account.and_then(|r| r.slot_interval_minutes))
                .unwrap_or(defaults.slot_interval_minutes),
            min_notice_minutes: team
                .and_then(|r| r.min_notice_minutes)
                .or(account.and_then(|r| r.min_notice_minutes))
                .unwrap_or(defaults.min_notice_minutes),
            max_advance_days: team
                .and_then(|r| r.max_advance_days)
                .or(account.and_then(|r| r.max_advance_days))
                .unwrap_or(defaults.max_advance_days),
            cancellation_cutoff_hours: team
                .and_then(|r| r.cancellation_cutoff_hours)
                .or(account.and_then(|r| r.cancellation_cutoff_hours))
                .unwrap_or(defaults.cancellation_cutoff_hours),
            allow_client_cancel: team
                .and_then(|r| r.allow_client_cancel)
                .or(account.and_then(|r| r.allow_client_cancel))
                .unwrap_or(defaults.allow_client_cancel),
            allow_client_reschedule: team
                .and_then(|r| r.allow_client_reschedule)
                .or(account.and_then(|r| r.allow_client_reschedule))
                .unwrap_or(defaults.allow_client_reschedule),

            // Account-wide fields: account → preset (team rows ignored)
            late_release_minutes: account
                .and_then(|r| r.late_release_minutes)
                .unwrap_or(defaults.late_release_minutes),
            waitlist_enabled: account
                .and_then(|r| r.waitlist_enabled)
                .unwrap_or(defaults.waitlist_enabled),
            queue_mode_enabled: preset.queue_features_enabled()
                && account
                    .and_then(|r| r.queue_mode_enabled)
                    .unwrap_or(defaults.queue_mode_enabled),
            queue_assignment_mode: account
                .and_then(|r| r.queue_assignment_mode.as_deref())
                .map(QueueAssignmentMode::parse_lenient)
                .unwrap_or(defaults.queue_assignment_mode),
            queue_dispatch_mode: account
                .and_then(|r| r.queue_dispatch_mode.as_deref())
                .map(QueueDispatchMode::parse_lenient)
                .unwrap_or(defaults.queue_dispatch_mode),
            queue_grace_minutes: account
                .and_then(|r| r.queue_grace_minutes)
                .unwrap_or(defaults.queue_grace_minutes),
            queue_pre_call_threshold: account
                .and_then(|r| r.queue_pre_call_threshold)
                .unwrap_or(defaults.queue_pre_call_threshold),
            queue_no_show_on_grace_expiry: account
                .and_then(|r| r.queue_no_show_on_grace_expiry)
                .unwrap_or(defaults.queue_no_show_on_grace_expiry),
            deposit_required: account
                .and_then(|r| r.deposit_required)
                .unwrap_or(defaults.deposit_required),
            deposit_amount: account
                .and_then(|r| r.deposit_amount)
                .unwrap_or(defaults.deposit_amount),
            no_show_fee_enabled: account
                .and_then(|r| r.no_show_fee_enabled)
                .unwrap_or(defaults.no_show_fee_enabled),
            no_show_fee_amount: account
                .and_then(|r| r.no_show_fee_amount)
                .unwrap_or(defaults.no_show_fee_amount),
        };

        Ok(settings.normalized())
    }

    /// Business timezone for an account (UTC when no profile is stored)
    pub fn timezone(&self, account_id: i64) -> StorageResult<Tz> {
        let profile = self.store.get_profile(account_id)?;
        Ok(profile
            .map(|p| parse_tz(&p.timezone))
            .unwrap_or(chrono_tz::UTC))
    }

    // ========== Writes (bump the cache) ==========

    pub fn upsert_override(&self, row: &SettingsOverride) -> StorageResult<()> {
        self.store.upsert_override(row)?;
        self.cache.bump(row.account_id);
        Ok(())
    }

    pub fn remove_override(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> StorageResult<bool> {
        let removed = self.store.remove_override(account_id, team_member_id)?;
        if removed {
            self.cache.bump(account_id);
        }
        Ok(removed)
    }

    pub fn upsert_profile(&self, profile: &AccountProfile) -> StorageResult<()> {
        self.store.upsert_profile(profile)?;
        self.cache.bump(profile.account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn service_with_sector(account_id: i64, sector: &str) -> SettingsService {
        let service = SettingsService::open_in_memory();
        let mut profile = AccountProfile::new(account_id);
        profile.company_sector = Some(sector.to_string());
        service.upsert_profile(&profile).unwrap();
        service
    }

    #[test]
    fn test_resolve_without_rows_uses_general_defaults() {
        let service = SettingsService::open_in_memory();
        let settings = service.resolve(1, None).unwrap();
        assert_eq!(settings.business_preset, BusinessPreset::ServiceGeneral);
        assert_eq!(settings.slot_interval_minutes, 30);
        assert!(!settings.deposit_required);
    }

    #[test]
    fn test_sector_drives_preset() {
        let service = service_with_sector(1, "Salon");
        let settings = service.resolve(1, None).unwrap();
        assert_eq!(settings.business_preset, BusinessPreset::Salon);
        assert!(settings.queue_mode_enabled);
        assert_eq!(settings.deposit_amount, Decimal::new(2000, 2));
    }

    #[test]
    fn test_stored_preset_wins_over_sector() {
        let service = service_with_sector(1, "Salon");
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                business_preset: Some("restaurant".to_string()),
                ..Default::default()
            })
            .unwrap();

        let settings = service.resolve(1, None).unwrap();
        assert_eq!(settings.business_preset, BusinessPreset::Restaurant);
    }

    #[test]
    fn test_team_override_wins_for_scheduling_fields() {
        let service = service_with_sector(1, "salon");
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                buffer_minutes: Some(20),
                min_notice_minutes: Some(120),
                ..Default::default()
            })
            .unwrap();
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: Some(7),
                buffer_minutes: Some(5),
                ..Default::default()
            })
            .unwrap();

        let member = service.resolve(1, Some(7)).unwrap();
        assert_eq!(member.buffer_minutes, 5); // team wins
        assert_eq!(member.min_notice_minutes, 120); // account fills the gap

        let account = service.resolve(1, None).unwrap();
        assert_eq!(account.buffer_minutes, 20);
    }

    #[test]
    fn test_team_row_cannot_override_queue_fields() {
        let service = service_with_sector(1, "salon");
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: Some(7),
                queue_grace_minutes: Some(45),
                ..Default::default()
            })
            .unwrap();

        let member = service.resolve(1, Some(7)).unwrap();
        // salon default, not the team row's value
        assert_eq!(member.queue_grace_minutes, 5);
    }

    #[test]
    fn test_queue_mode_forced_off_for_non_salon() {
        let service = service_with_sector(1, "restaurant");
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                queue_mode_enabled: Some(true),
                ..Default::default()
            })
            .unwrap();

        let settings = service.resolve(1, None).unwrap();
        assert!(!settings.queue_mode_enabled);
    }

    #[test]
    fn test_unknown_preset_normalizes_to_general() {
        let service = SettingsService::open_in_memory();
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                business_preset: Some("  Barber Shop ".to_string()),
                ..Default::default()
            })
            .unwrap();

        let settings = service.resolve(1, None).unwrap();
        assert_eq!(settings.business_preset, BusinessPreset::ServiceGeneral);
    }

    #[test]
    fn test_stored_values_clamped_on_resolve() {
        let service = SettingsService::open_in_memory();
        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                buffer_minutes: Some(999),
                slot_interval_minutes: Some(1),
                ..Default::default()
            })
            .unwrap();

        let settings = service.resolve(1, None).unwrap();
        assert_eq!(settings.buffer_minutes, 240);
        assert_eq!(settings.slot_interval_minutes, 5);
    }

    #[test]
    fn test_write_bumps_cache() {
        let service = service_with_sector(1, "salon");
        let before = service.resolve(1, None).unwrap();
        assert_eq!(before.buffer_minutes, 10);

        service
            .upsert_override(&SettingsOverride {
                account_id: 1,
                team_member_id: None,
                buffer_minutes: Some(30),
                ..Default::default()
            })
            .unwrap();

        let after = service.resolve(1, None).unwrap();
        assert_eq!(after.buffer_minutes, 30);
    }

    #[test]
    fn test_timezone_fallback() {
        let service = SettingsService::open_in_memory();
        assert_eq!(service.timezone(1).unwrap(), chrono_tz::UTC);

        let mut profile = AccountProfile::new(1);
        profile.timezone = "Europe/Madrid".to_string();
        service.upsert_profile(&profile).unwrap();
        assert_eq!(service.timezone(1).unwrap(), chrono_tz::Europe::Madrid);
    }
}
