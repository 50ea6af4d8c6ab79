//! Reservations API Handlers
//!
//! Booking plus the PATCH action dispatch
//! (cancel/reschedule/confirm/start_service/complete/no_show).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::reservation::{ReservationEvent, ReservationSnapshot, ReservationSource};

use crate::api::convert::{ActorPayload, parse_timestamp};
use crate::core::ServerState;
use crate::reservations::BookingRequest;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub account_id: i64,
    pub team_member_id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_user_id: Option<i64>,
    #[serde(default)]
    pub service_id: Option<i64>,
    /// RFC 3339
    pub starts_at: String,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub buffer_minutes: Option<i32>,
    pub source: ReservationSource,
    #[serde(default)]
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub client_notes: Option<String>,
    #[serde(flatten)]
    pub actor: ActorPayload,
}

/// POST /api/reservations - 创建预约
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<ReservationSnapshot>> {
    let starts_at = parse_timestamp("starts_at", &payload.starts_at)?;

    let request = BookingRequest {
        account_id: payload.account_id,
        team_member_id: payload.team_member_id,
        client_id: payload.client_id,
        client_user_id: payload.client_user_id,
        service_id: payload.service_id,
        source: payload.source,
        starts_at,
        duration_minutes: payload.duration_minutes,
        buffer_override: payload.buffer_minutes,
        internal_notes: payload.internal_notes,
        client_notes: payload.client_notes,
    };

    let snapshot = state
        .manager
        .book(request, payload.actor.into_actor())
        .await?;
    Ok(Json(snapshot))
}

/// PATCH action keywords
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutateAction {
    Cancel,
    Reschedule,
    Confirm,
    StartService,
    Complete,
    NoShow,
}

#[derive(Debug, Deserialize)]
pub struct MutateRequest {
    pub action: MutateAction,
    #[serde(default)]
    pub reason: Option<String>,
    /// RFC 3339, required for reschedule
    #[serde(default)]
    pub new_start: Option<String>,
    #[serde(default)]
    pub new_team_member_id: Option<i64>,
    #[serde(flatten)]
    pub actor: ActorPayload,
}

/// PATCH /api/reservations/{id} - 预约状态操作
pub async fn mutate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MutateRequest>,
) -> AppResult<Json<ReservationSnapshot>> {
    let actor = payload.actor.into_actor();

    let snapshot = match payload.action {
        MutateAction::Cancel => state.manager.cancel(&id, actor, payload.reason).await?,
        MutateAction::Reschedule => {
            let new_start = payload
                .new_start
                .as_deref()
                .ok_or_else(|| AppError::validation("new_start is required for reschedule"))?;
            let new_start = parse_timestamp("new_start", new_start)?;
            state
                .manager
                .reschedule(
                    &id,
                    new_start,
                    payload.new_team_member_id,
                    actor,
                    payload.reason,
                )
                .await?
        }
        MutateAction::Confirm => state.manager.confirm(&id, actor).await?,
        MutateAction::StartService => state.manager.start_service(&id, actor).await?,
        MutateAction::Complete => state.manager.complete(&id, actor).await?,
        MutateAction::NoShow => state.manager.mark_no_show(&id, actor).await?,
    };

    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub account_id: i64,
    #[serde(default)]
    pub team_member_id: Option<i64>,
}

/// GET /api/reservations - 活跃预约列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ReservationSnapshot>>> {
    let mut reservations = match query.team_member_id {
        Some(member) => state.manager.active_for_resource(query.account_id, member)?,
        None => state.manager.active_for_account(query.account_id)?,
    };
    reservations.sort_by_key(|r| r.starts_at);
    Ok(Json(reservations))
}

/// GET /api/reservations/{id} - 单个预约
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ReservationSnapshot>> {
    let snapshot = state.manager.require_snapshot(&id)?;
    Ok(Json(snapshot))
}

/// GET /api/reservations/{id}/events - 审计事件流
pub async fn events(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ReservationEvent>>> {
    // 404 for unknown ids, empty stream is impossible for existing rows
    state.manager.require_snapshot(&id)?;
    let events = state.manager.events_for_reservation(&id)?;
    Ok(Json(events))
}
