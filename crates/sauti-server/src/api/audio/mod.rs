//! Saved-audio retrieval endpoints.

pub mod handlers;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audio/{filename}", get(handlers::get_audio))
        .route("/api/duration/{filename}", get(handlers::get_duration))
}
