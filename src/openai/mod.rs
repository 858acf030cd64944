pub mod client;
pub mod dto;
pub mod handlers;
pub mod prompts;
pub mod services;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/openai/analyze-image", post(handlers::analyze_image))
        .route("/openai/chat", post(handlers::chat))
        // above the 10MiB file limit so oversize uploads hit our own check
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
}
