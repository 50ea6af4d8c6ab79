//! Resolved-settings cache
//!
//! Keyed by (account, team-member) and invalidated with [`SettingsCache::bump`]
//! on every settings write — an explicit cache component rather than ambient
//! static state. Uses DashMap for lock-free concurrent access.

use dashmap::DashMap;
use shared::models::settings::ReservationSettings;

/// Cache size warning threshold
const CACHE_WARN_THRESHOLD: usize = 10_000;

/// Cache of resolved settings values
#[derive(Debug, Default)]
pub struct SettingsCache {
    /// (account_id, team_member_id-or-0) → resolved settings
    entries: DashMap<(i64, i64), ReservationSettings>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn key(account_id: i64, team_member_id: Option<i64>) -> (i64, i64) {
        (account_id, team_member_id.unwrap_or(0))
    }

    pub fn get(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
    ) -> Option<ReservationSettings> {
        self.entries
            .get(&Self::key(account_id, team_member_id))
            .map(|entry| entry.clone())
    }

    pub fn insert(
        &self,
        account_id: i64,
        team_member_id: Option<i64>,
        settings: ReservationSettings,
    ) {
        self.entries
            .insert(Self::key(account_id, team_member_id), settings);
        let len = self.entries.len();
        if len > CACHE_WARN_THRESHOLD {
            tracing::warn!(cache_size = len, "Settings cache exceeds threshold");
        }
    }

    /// Invalidate every cached resolution for an account.
    ///
    /// A team-member write still bumps the whole account: account-level
    /// fields flow into every member's resolution.
    pub fn bump(&self, account_id: i64) {
        self.entries.retain(|(account, _), _| *account != account_id);
        tracing::debug!(account_id, "Settings cache bumped");
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::presets;
    use shared::models::settings::BusinessPreset;

    #[test]
    fn test_get_insert() {
        let cache = SettingsCache::new();
        assert!(cache.get(1, None).is_none());

        cache.insert(1, None, presets::defaults(BusinessPreset::Salon));
        let hit = cache.get(1, None).unwrap();
        assert_eq!(hit.business_preset, BusinessPreset::Salon);

        // Different member key misses
        assert!(cache.get(1, Some(5)).is_none());
    }

    #[test]
    fn test_bump_clears_whole_account() {
        let cache = SettingsCache::new();
        cache.insert(1, None, presets::defaults(BusinessPreset::Salon));
        cache.insert(1, Some(5), presets::defaults(BusinessPreset::Salon));
        cache.insert(2, None, presets::defaults(BusinessPreset::Restaurant));

        cache.bump(1);

        assert!(cache.get(1, None).is_none());
        assert!(cache.get(1, Some(5)).is_none());
        assert!(cache.get(2, None).is_some());
        assert_eq!(cache.len(), 1);
    }
}
