use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use tracing::instrument;

use crate::error::ApiError;
use crate::images::services::{preprocess, validate_upload};
use crate::openai::dto::{AnalyzeImageResponse, ChatRequest, ChatResponse};
use crate::openai::services::{analyze_nutrition_image, chat_with_nutrition_context};
use crate::state::AppState;

/// POST /api/openai/analyze-image (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn analyze_image(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<AnalyzeImageResponse>, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;
            file = Some((content_type, data));
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| ApiError::Validation("No file uploaded".into()))?;
    validate_upload(&content_type, data.len())?;

    let optimized =
        preprocess(&data).map_err(|e| e.with_context("Failed to analyze image"))?;
    let base64_image = general_purpose::STANDARD.encode(&optimized);

    let result = analyze_nutrition_image(&state, &base64_image)
        .await
        .map_err(|e| e.with_context("Failed to analyze image"))?;

    Ok(Json(AnalyzeImageResponse {
        success: true,
        data: result,
    }))
}

/// POST /api/openai/chat
#[instrument(skip(state, body))]
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }

    let history = body.conversation_history.unwrap_or_default();
    let reply = chat_with_nutrition_context(
        &state,
        &body.message,
        body.nutrition_context.as_ref(),
        &history,
    )
    .await
    .map_err(|e| e.with_context("Failed to get chat response"))?;

    Ok(Json(ChatResponse {
        success: true,
        response: reply,
    }))
}
