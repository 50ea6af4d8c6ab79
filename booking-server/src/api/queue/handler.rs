//! Live Queue API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::reservation::ReservationSnapshot;

use crate::api::convert::ActorPayload;
use crate::core::ServerState;
use crate::queue::{CallOutcome, QueueBoard, WalkInRequest};
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    pub account_id: i64,
    #[serde(default)]
    pub team_member_id: Option<i64>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_user_id: Option<i64>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub actor: ActorPayload,
}

/// POST /api/queue/tickets - 发放现场排队票
pub async fn create_ticket(
    State(state): State<ServerState>,
    Json(payload): Json<TicketRequest>,
) -> AppResult<Json<ReservationSnapshot>> {
    let request = WalkInRequest {
        account_id: payload.account_id,
        team_member_id: payload.team_member_id,
        client_id: payload.client_id,
        client_user_id: payload.client_user_id,
        service_id: payload.service_id,
        estimated_duration_minutes: payload.estimated_duration_minutes,
        notes: payload.notes,
    };

    let snapshot = state
        .queue
        .issue_walk_in(request, payload.actor.into_actor())
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct CallNextRequest {
    pub account_id: i64,
    #[serde(default)]
    pub team_member_id: Option<i64>,
    #[serde(flatten)]
    pub actor: ActorPayload,
}

/// POST /api/queue/call-next - 叫号
pub async fn call_next(
    State(state): State<ServerState>,
    Json(payload): Json<CallNextRequest>,
) -> AppResult<Json<CallOutcome>> {
    let outcome = state
        .queue
        .call_next(
            payload.account_id,
            payload.team_member_id,
            payload.actor.into_actor(),
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub reservation_id: String,
    #[serde(flatten)]
    pub actor: ActorPayload,
}

/// POST /api/queue/check-in - 到场确认
pub async fn check_in(
    State(state): State<ServerState>,
    Json(payload): Json<CheckInRequest>,
) -> AppResult<Json<ReservationSnapshot>> {
    let snapshot = state
        .queue
        .check_in(&payload.reservation_id, payload.actor.into_actor())
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub account_id: i64,
}

/// GET /api/queue/board - 队列看板
pub async fn board(
    State(state): State<ServerState>,
    Query(query): Query<BoardQuery>,
) -> AppResult<Json<QueueBoard>> {
    let board = state.queue.board(query.account_id)?;
    Ok(Json(board))
}
