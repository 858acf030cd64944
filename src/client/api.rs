use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::openai::dto::{
    AnalyzeImageResponse, ChatMessage, ChatResponse, ImageAnalysisResult, NutritionData,
};

/// Client-facing failure shape: one human-readable message per kind.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The server answered with an error body.
    #[error("{0}")]
    Api(String),
    /// The server could not be reached or did not answer in time.
    #[error("network error: {0}")]
    Network(String),
}

/// The two server operations, behind a trait so the session store can be
/// driven by a scripted fake in tests.
#[async_trait]
pub trait NutritionApi: Send + Sync {
    async fn analyze_image(
        &self,
        file: Vec<u8>,
        content_type: &str,
    ) -> Result<ImageAnalysisResult, ClientError>;

    async fn chat(
        &self,
        message: &str,
        nutrition_context: Option<&NutritionData>,
        conversation_history: &[ChatMessage],
    ) -> Result<String, ClientError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nutrition_context: Option<&'a NutritionData>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    conversation_history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpNutritionApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpNutritionApi {
    /// `base_url` points at the server's `/api` prefix,
    /// e.g. `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn error_message(response: reqwest::Response, fallback: &str) -> ClientError {
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| fallback.to_string());
        ClientError::Api(message)
    }
}

#[async_trait]
impl NutritionApi for HttpNutritionApi {
    async fn analyze_image(
        &self,
        file: Vec<u8>,
        content_type: &str,
    ) -> Result<ImageAnalysisResult, ClientError> {
        let part = reqwest::multipart::Part::bytes(file)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| ClientError::Api(format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/openai/analyze-image", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_message(response, "Failed to analyze image").await);
        }

        let body: AnalyzeImageResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(body.data)
    }

    async fn chat(
        &self,
        message: &str,
        nutrition_context: Option<&NutritionData>,
        conversation_history: &[ChatMessage],
    ) -> Result<String, ClientError> {
        let body = ChatRequestBody {
            message,
            nutrition_context,
            conversation_history,
        };

        let response = self
            .client
            .post(format!("{}/openai/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_message(response, "Failed to get chat response").await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::dto::Role;

    #[test]
    fn test_chat_request_body_wire_shape() {
        let data = NutritionData {
            calories: Some(150.0),
            ..Default::default()
        };
        let history = vec![ChatMessage {
            role: Role::Assistant,
            content: "hi".into(),
            timestamp: Some(1),
        }];
        let body = ChatRequestBody {
            message: "how much protein?",
            nutrition_context: Some(&data),
            conversation_history: &history,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "how much protein?");
        assert_eq!(json["nutritionContext"]["calories"], 150.0);
        assert_eq!(json["conversationHistory"][0]["role"], "assistant");
    }

    #[test]
    fn test_chat_request_body_omits_absent_fields() {
        let body = ChatRequestBody {
            message: "hi",
            nutrition_context: None,
            conversation_history: &[],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("nutritionContext").is_none());
        assert!(json.get("conversationHistory").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpNutritionApi::new("http://localhost:3000/api/");
        assert_eq!(api.base_url, "http://localhost:3000/api");
    }
}
