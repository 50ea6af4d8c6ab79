//! Reservations API 模块

mod handler;

use axum::{Router, routing::get, routing::patch, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", patch(handler::mutate).get(handler::get_by_id))
        .route("/{id}/events", get(handler::events))
}
