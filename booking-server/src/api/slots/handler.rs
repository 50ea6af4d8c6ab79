//! Bookable Slots API Handler

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::api::convert::parse_timestamp;
use crate::core::ServerState;
use crate::scheduling::{Slot, SlotRequest, available_slots};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub account_id: i64,
    pub team_member_id: i64,
    /// RFC 3339 range start
    pub from: String,
    /// RFC 3339 range end
    pub to: String,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub timezone: String,
    pub slots: Vec<Slot>,
}

/// GET /api/slots - 查询可预约时段
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<SlotsResponse>> {
    let range_start = parse_timestamp("from", &query.from)?;
    let range_end = parse_timestamp("to", &query.to)?;
    if range_end <= range_start {
        return Err(AppError::validation("'to' must be after 'from'"));
    }

    let settings = state
        .settings()
        .resolve(query.account_id, Some(query.team_member_id))
        .map_err(|e| AppError::internal(e.to_string()))?;
    let tz = state
        .settings()
        .timezone(query.account_id)
        .map_err(|e| AppError::internal(e.to_string()))?;
    let availability = state
        .settings()
        .store()
        .get_availability(query.account_id, query.team_member_id)
        .map_err(|e| AppError::internal(e.to_string()))?;
    let existing = state
        .manager
        .active_for_resource(query.account_id, query.team_member_id)?;

    let slots = available_slots(&SlotRequest {
        settings: &settings,
        team_member_id: query.team_member_id,
        existing: &existing,
        availability: availability.as_ref(),
        range_start,
        range_end,
        duration_minutes: query.duration_minutes.unwrap_or(60),
        now: shared::util::now_millis(),
        tz,
    });

    Ok(Json(SlotsResponse {
        timezone: tz.name().to_string(),
        slots,
    }))
}
