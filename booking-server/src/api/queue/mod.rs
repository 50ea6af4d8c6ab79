//! Live Queue API 模块

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/queue", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/tickets", post(handler::create_ticket))
        .route("/call-next", post(handler::call_next))
        .route("/check-in", post(handler::check_in))
        .route("/board", get(handler::board))
}
