//! Reservation Settings API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::availability::{AvailabilityException, AvailabilityRow, WeeklyWindow};
use shared::models::settings::{AccountProfile, ReservationSettings, SettingsOverride};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub account_id: i64,
    #[serde(default)]
    pub team_member_id: Option<i64>,
}

/// GET /api/settings - 解析生效配置
pub async fn resolve(
    State(state): State<ServerState>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<ReservationSettings>> {
    let settings = state
        .settings()
        .resolve(query.account_id, query.team_member_id)
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(settings))
}

/// Sparse override payload; absent fields keep inheriting
#[derive(Debug, Deserialize, Validate)]
pub struct OverridePayload {
    pub business_preset: Option<String>,
    #[validate(range(min = 0, max = 240))]
    pub buffer_minutes: Option<i32>,
    #[validate(range(min = 5, max = 120))]
    pub slot_interval_minutes: Option<i32>,
    #[validate(range(min = 0, max = 10080))]
    pub min_notice_minutes: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub max_advance_days: Option<i32>,
    #[validate(range(min = 0, max = 720))]
    pub cancellation_cutoff_hours: Option<i32>,
    pub allow_client_cancel: Option<bool>,
    pub allow_client_reschedule: Option<bool>,
    #[validate(range(min = 0, max = 240))]
    pub late_release_minutes: Option<i32>,
    pub waitlist_enabled: Option<bool>,
    pub queue_mode_enabled: Option<bool>,
    pub queue_assignment_mode: Option<String>,
    pub queue_dispatch_mode: Option<String>,
    #[validate(range(min = 1, max = 60))]
    pub queue_grace_minutes: Option<i32>,
    #[validate(range(min = 1, max = 20))]
    pub queue_pre_call_threshold: Option<i32>,
    pub queue_no_show_on_grace_expiry: Option<bool>,
    pub deposit_required: Option<bool>,
    pub deposit_amount: Option<Decimal>,
    pub no_show_fee_enabled: Option<bool>,
    pub no_show_fee_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    pub company_sector: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    pub account_id: i64,
    #[serde(default)]
    pub team_member_id: Option<i64>,
    #[serde(default)]
    pub profile: Option<ProfilePayload>,
    #[serde(default)]
    pub settings: Option<OverridePayload>,
}

/// PUT /api/settings - 写入覆盖行并失效缓存
pub async fn upsert(
    State(state): State<ServerState>,
    Json(payload): Json<UpsertRequest>,
) -> AppResult<Json<ReservationSettings>> {
    if payload.account_id <= 0 {
        return Err(AppError::validation("account_id must be positive"));
    }

    if let Some(profile) = payload.profile {
        let current = state
            .settings()
            .store()
            .get_profile(payload.account_id)
            .map_err(|e| AppError::internal(e.to_string()))?
            .unwrap_or_else(|| AccountProfile::new(payload.account_id));

        let updated = AccountProfile {
            account_id: payload.account_id,
            company_sector: profile.company_sector.or(current.company_sector),
            timezone: profile.timezone.unwrap_or(current.timezone),
            updated_at: shared::util::now_millis(),
        };
        state
            .settings()
            .upsert_profile(&updated)
            .map_err(|e| AppError::internal(e.to_string()))?;
    }

    if let Some(overrides) = payload.settings {
        overrides
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let row = SettingsOverride {
            account_id: payload.account_id,
            team_member_id: payload.team_member_id,
            business_preset: overrides.business_preset,
            buffer_minutes: overrides.buffer_minutes,
            slot_interval_minutes: overrides.slot_interval_minutes,
            min_notice_minutes: overrides.min_notice_minutes,
            max_advance_days: overrides.max_advance_days,
            cancellation_cutoff_hours: overrides.cancellation_cutoff_hours,
            allow_client_cancel: overrides.allow_client_cancel,
            allow_client_reschedule: overrides.allow_client_reschedule,
            late_release_minutes: overrides.late_release_minutes,
            waitlist_enabled: overrides.waitlist_enabled,
            queue_mode_enabled: overrides.queue_mode_enabled,
            queue_assignment_mode: overrides.queue_assignment_mode,
            queue_dispatch_mode: overrides.queue_dispatch_mode,
            queue_grace_minutes: overrides.queue_grace_minutes,
            queue_pre_call_threshold: overrides.queue_pre_call_threshold,
            queue_no_show_on_grace_expiry: overrides.queue_no_show_on_grace_expiry,
            deposit_required: overrides.deposit_required,
            deposit_amount: overrides.deposit_amount,
            no_show_fee_enabled: overrides.no_show_fee_enabled,
            no_show_fee_amount: overrides.no_show_fee_amount,
            updated_at: shared::util::now_millis(),
        };
        state
            .settings()
            .upsert_override(&row)
            .map_err(|e| AppError::internal(e.to_string()))?;
    }

    let resolved = state
        .settings()
        .resolve(payload.account_id, payload.team_member_id)
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(resolved))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityPayload {
    pub account_id: i64,
    pub team_member_id: i64,
    #[serde(default)]
    pub weekly: Vec<WeeklyWindow>,
    #[serde(default)]
    pub exceptions: Vec<AvailabilityException>,
}

/// PUT /api/settings/availability - 写入资源工作时间
pub async fn upsert_availability(
    State(state): State<ServerState>,
    Json(payload): Json<AvailabilityPayload>,
) -> AppResult<Json<AvailabilityRow>> {
    if payload.weekly.iter().any(|w| !w.is_valid()) {
        return Err(AppError::validation(
            "weekly windows must fit within one day with start < end",
        ));
    }

    let row = AvailabilityRow {
        account_id: payload.account_id,
        team_member_id: payload.team_member_id,
        weekly: payload.weekly,
        exceptions: payload.exceptions,
        updated_at: shared::util::now_millis(),
    };
    state
        .settings()
        .store()
        .upsert_availability(&row)
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(row))
}
