//! Text-to-speech endpoints.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tts", post(handlers::synthesize_stream))
        .route("/api/tts/complete", post(handlers::synthesize_json))
        .route("/api/tts/json", post(handlers::synthesize_json))
        .route("/api/tts/save", post(handlers::synthesize_and_save))
        .route("/api/tts/languages", get(handlers::list_languages))
}
