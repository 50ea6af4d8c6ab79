//! Reservation Settings Model
//!
//! One resolved [`ReservationSettings`] value exists per (account, optional
//! team-member) lookup. Stored overrides ([`SettingsOverride`]) are sparse;
//! resolution fills the gaps from the business-preset defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hard ceiling for buffers, matching the original scheduling rules.
pub const MAX_BUFFER_MINUTES: i32 = 240;

/// Business preset enum (预设业务类型)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusinessPreset {
    #[default]
    ServiceGeneral,
    Salon,
    Restaurant,
}

impl BusinessPreset {
    /// Canonical string form (matches the stored/wire value)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceGeneral => "service_general",
            Self::Salon => "salon",
            Self::Restaurant => "restaurant",
        }
    }

    /// Lenient parse: lowercased, trimmed, spaces to underscores.
    /// Unknown or blank values normalize to `service_general`.
    pub fn parse_lenient(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace(' ', "_");
        match normalized.as_str() {
            "salon" => Self::Salon,
            "restaurant" => Self::Restaurant,
            _ => Self::ServiceGeneral,
        }
    }

    /// Map an account's business sector to its preset.
    pub fn from_sector(sector: Option<&str>) -> Self {
        sector.map(Self::parse_lenient).unwrap_or_default()
    }

    /// Live-queue features are a salon capability only; other presets keep
    /// classic appointment scheduling regardless of stored flags.
    pub const fn queue_features_enabled(&self) -> bool {
        matches!(self, Self::Salon)
    }
}

impl std::fmt::Display for BusinessPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue assignment mode: one lane per staff member, or one shared lane
/// staff pull from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueAssignmentMode {
    #[default]
    PerStaff,
    GlobalPull,
}

impl QueueAssignmentMode {
    /// Lenient parse; unknown values fall back to `per_staff`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "global_pull" => Self::GlobalPull,
            _ => Self::PerStaff,
        }
    }
}

/// Queue dispatch mode. Extensible; unknown values fall back to
/// `fifo_with_appointment_priority`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueDispatchMode {
    /// Plain FIFO by enqueue time, tiers ignored
    Fifo,
    /// Appointment tier always dequeues before walk-in tier; FIFO within tier
    #[default]
    FifoWithAppointmentPriority,
}

impl QueueDispatchMode {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "fifo" => Self::Fifo,
            _ => Self::FifoWithAppointmentPriority,
        }
    }
}

/// Fully-resolved scheduling configuration for an (account, team-member)
///
/// Every field is populated; resolution never fails (exhaustive fallback to
/// preset defaults).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationSettings {
    pub business_preset: BusinessPreset,
    /// Gap enforced on both sides of a reservation on the same resource
    pub buffer_minutes: i32,
    /// Granularity of offered start times
    pub slot_interval_minutes: i32,
    /// Minimum lead time before a bookable slot
    pub min_notice_minutes: i32,
    /// Farthest future date bookable; 0 means same-day only
    pub max_advance_days: i32,
    /// Latest time before start a client may cancel/reschedule
    pub cancellation_cutoff_hours: i32,
    pub allow_client_cancel: bool,
    pub allow_client_reschedule: bool,
    /// Grace before an unconfirmed slot is released back to availability
    pub late_release_minutes: i32,
    pub waitlist_enabled: bool,
    pub queue_mode_enabled: bool,
    pub queue_assignment_mode: QueueAssignmentMode,
    pub queue_dispatch_mode: QueueDispatchMode,
    /// Time a called client has to respond before no-show handling
    pub queue_grace_minutes: i32,
    /// People ahead at which the next client is pre-notified
    pub queue_pre_call_threshold: i32,
    pub queue_no_show_on_grace_expiry: bool,
    pub deposit_required: bool,
    pub deposit_amount: Decimal,
    pub no_show_fee_enabled: bool,
    pub no_show_fee_amount: Decimal,
}

impl ReservationSettings {
    /// Apply the range clamps the original enforces on stored values.
    ///
    /// buffer 0..=240, interval 5..=120, grace 1..=60, pre-call threshold
    /// 1..=20, money fields non-negative rounded to 2dp, windows never
    /// negative. Queue features are forced off for non-salon presets.
    pub fn normalized(mut self) -> Self {
        self.buffer_minutes = self.buffer_minutes.clamp(0, MAX_BUFFER_MINUTES);
        self.slot_interval_minutes = self.slot_interval_minutes.clamp(5, 120);
        self.min_notice_minutes = self.min_notice_minutes.max(0);
        self.max_advance_days = self.max_advance_days.max(0);
        self.cancellation_cutoff_hours = self.cancellation_cutoff_hours.max(0);
        self.late_release_minutes = self.late_release_minutes.clamp(0, MAX_BUFFER_MINUTES);
        self.queue_grace_minutes = self.queue_grace_minutes.clamp(1, 60);
        self.queue_pre_call_threshold = self.queue_pre_call_threshold.clamp(1, 20);
        self.deposit_amount = normalize_money(self.deposit_amount);
        self.no_show_fee_amount = normalize_money(self.no_show_fee_amount);
        if !self.business_preset.queue_features_enabled() {
            self.queue_mode_enabled = false;
        }
        self
    }
}

/// Round to 2dp and floor at zero.
pub fn normalize_money(value: Decimal) -> Decimal {
    value.round_dp(2).max(Decimal::ZERO)
}

/// Stored settings override row (sparse; `None` means "inherit")
///
/// One row per account plus optional rows per team member. Team-member rows
/// carry only the scheduling fields; the queue and payment knobs are
/// account-wide and ignored on team rows during resolution.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsOverride {
    pub account_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_member_id: Option<i64>,
    /// Raw stored preset string; normalized at resolve time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_interval_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_notice_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_advance_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_cutoff_hours: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_client_cancel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_client_reschedule: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_release_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_mode_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_assignment_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_dispatch_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_grace_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_pre_call_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_no_show_on_grace_expiry: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_fee_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_fee_amount: Option<Decimal>,
    #[serde(default)]
    pub updated_at: i64,
}

/// Account profile: the two account-level attributes resolution needs
/// (sector drives the preset fallback, timezone anchors slot grids).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub account_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_sector: Option<String>,
    /// IANA timezone name, e.g. "Europe/Madrid"
    pub timezone: String,
    #[serde(default)]
    pub updated_at: i64,
}

impl AccountProfile {
    pub fn new(account_id: i64) -> Self {
        Self {
            account_id,
            company_sector: None,
            timezone: "UTC".to_string(),
            updated_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse_lenient() {
        assert_eq!(BusinessPreset::parse_lenient("salon"), BusinessPreset::Salon);
        assert_eq!(
            BusinessPreset::parse_lenient("  Restaurant "),
            BusinessPreset::Restaurant
        );
        assert_eq!(
            BusinessPreset::parse_lenient("SERVICE GENERAL"),
            BusinessPreset::ServiceGeneral
        );
        assert_eq!(
            BusinessPreset::parse_lenient("barbershop"),
            BusinessPreset::ServiceGeneral
        );
        assert_eq!(BusinessPreset::parse_lenient(""), BusinessPreset::ServiceGeneral);
    }

    #[test]
    fn test_from_sector() {
        assert_eq!(BusinessPreset::from_sector(Some("Salon")), BusinessPreset::Salon);
        assert_eq!(BusinessPreset::from_sector(None), BusinessPreset::ServiceGeneral);
    }

    #[test]
    fn test_queue_features_salon_only() {
        assert!(BusinessPreset::Salon.queue_features_enabled());
        assert!(!BusinessPreset::Restaurant.queue_features_enabled());
        assert!(!BusinessPreset::ServiceGeneral.queue_features_enabled());
    }

    #[test]
    fn test_normalized_clamps() {
        let settings = ReservationSettings {
            business_preset: BusinessPreset::Salon,
            buffer_minutes: 999,
            slot_interval_minutes: 1,
            min_notice_minutes: -5,
            max_advance_days: -1,
            cancellation_cutoff_hours: -3,
            allow_client_cancel: true,
            allow_client_reschedule: true,
            late_release_minutes: 500,
            waitlist_enabled: true,
            queue_mode_enabled: true,
            queue_assignment_mode: QueueAssignmentMode::PerStaff,
            queue_dispatch_mode: QueueDispatchMode::FifoWithAppointmentPriority,
            queue_grace_minutes: 0,
            queue_pre_call_threshold: 99,
            queue_no_show_on_grace_expiry: true,
            deposit_required: true,
            deposit_amount: Decimal::new(-400, 2),
            no_show_fee_enabled: true,
            no_show_fee_amount: Decimal::new(15005, 3),
        }
        .normalized();

        assert_eq!(settings.buffer_minutes, MAX_BUFFER_MINUTES);
        assert_eq!(settings.slot_interval_minutes, 5);
        assert_eq!(settings.min_notice_minutes, 0);
        assert_eq!(settings.max_advance_days, 0);
        assert_eq!(settings.cancellation_cutoff_hours, 0);
        assert_eq!(settings.late_release_minutes, MAX_BUFFER_MINUTES);
        assert_eq!(settings.queue_grace_minutes, 1);
        assert_eq!(settings.queue_pre_call_threshold, 20);
        assert_eq!(settings.deposit_amount, Decimal::ZERO);
        assert_eq!(settings.no_show_fee_amount, Decimal::new(1500, 2));
        // salon keeps queue mode
        assert!(settings.queue_mode_enabled);
    }

    #[test]
    fn test_normalized_forces_queue_off_for_non_salon() {
        let settings = ReservationSettings {
            business_preset: BusinessPreset::Restaurant,
            buffer_minutes: 15,
            slot_interval_minutes: 15,
            min_notice_minutes: 30,
            max_advance_days: 30,
            cancellation_cutoff_hours: 6,
            allow_client_cancel: true,
            allow_client_reschedule: true,
            late_release_minutes: 15,
            waitlist_enabled: true,
            queue_mode_enabled: true,
            queue_assignment_mode: QueueAssignmentMode::GlobalPull,
            queue_dispatch_mode: QueueDispatchMode::FifoWithAppointmentPriority,
            queue_grace_minutes: 10,
            queue_pre_call_threshold: 2,
            queue_no_show_on_grace_expiry: true,
            deposit_required: true,
            deposit_amount: Decimal::new(2500, 2),
            no_show_fee_enabled: true,
            no_show_fee_amount: Decimal::new(2500, 2),
        }
        .normalized();

        assert!(!settings.queue_mode_enabled);
    }
}
