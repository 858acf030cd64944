use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure kinds for the two OpenAI-backed operations.
///
/// `Validation` and `Processing` are caught before any model call;
/// the `Upstream*`/`Network`/`Timeout` kinds come back from the call itself.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Processing(String),

    #[error("No content in OpenAI response")]
    UpstreamEmpty,

    #[error("Failed to parse JSON from OpenAI response: {0}")]
    UpstreamFormat(String),

    #[error("OpenAI request failed: {0}")]
    Network(String),

    #[error("OpenAI request timed out after {0}s")]
    Timeout(u64),
}

impl ApiError {
    /// Wrap with the operation-level prefix the original API exposed,
    /// keeping the kind intact.
    pub fn with_context(self, prefix: &str) -> Self {
        match self {
            ApiError::Validation(m) => ApiError::Validation(format!("{}: {}", prefix, m)),
            other => ApiError::Processing(format!("{}: {}", prefix, other)),
        }
    }
}

// Everything maps to 400 with { "message": ... } so existing clients keep
// working; the kind still reaches the logs through Display.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::warn!(error = %message, "request failed");
        (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
    }
}
