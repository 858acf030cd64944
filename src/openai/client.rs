use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::ApiError;

/// One part of a multimodal user message, in the OpenAI wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageUrl,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text {
            content_type: "text".into(),
            text: text.into(),
        }
    }

    pub fn image_url(url: impl Into<String>, detail: &str) -> Self {
        ContentPart::ImageUrl {
            content_type: "image_url".into(),
            image_url: ImageUrl {
                url: url.into(),
                detail: Some(detail.into()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: ApiContent,
}

impl ApiMessage {
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: ApiContent::Text(content.into()),
        }
    }

    pub fn parts(role: &str, parts: Vec<ContentPart>) -> Self {
        Self {
            role: role.into(),
            content: ApiContent::Parts(parts),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Seam over the external completion API so services can be exercised with a
/// scripted fake. One implementation serves both the vision and chat paths;
/// the caller picks model and sampling parameters.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ApiMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ApiError>;
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    timeout_seconds: u64,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
            client,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_seconds)
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

fn reply_from(response: ChatCompletionResponse) -> Result<String, ApiError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ApiError::UpstreamEmpty)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ApiMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ApiError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            temperature,
        };

        tracing::debug!(%model, max_tokens, temperature, "sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "OpenAI API error");
            return Err(ApiError::Network(format!(
                "OpenAI API error ({}): {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::UpstreamFormat(e.to_string()))?;

        reply_from(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChatCompletionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_reply_from_first_choice() {
        let r = parse(r#"{"choices":[{"message":{"content":"hello"}}]}"#);
        assert_eq!(reply_from(r).unwrap(), "hello");
    }

    #[test]
    fn test_reply_from_empty_content_is_upstream_empty() {
        let r = parse(r#"{"choices":[{"message":{"content":""}}]}"#);
        assert!(matches!(reply_from(r), Err(ApiError::UpstreamEmpty)));

        let r = parse(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(matches!(reply_from(r), Err(ApiError::UpstreamEmpty)));

        let r = parse(r#"{"choices":[]}"#);
        assert!(matches!(reply_from(r), Err(ApiError::UpstreamEmpty)));
    }

    #[test]
    fn test_multimodal_message_wire_shape() {
        let msg = ApiMessage::parts(
            "user",
            vec![
                ContentPart::text("look at this"),
                ContentPart::image_url("data:image/jpeg;base64,AAAA", "high"),
            ],
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["detail"], "high");
    }

    #[test]
    fn test_plain_text_message_serializes_as_string() {
        let msg = ApiMessage::text("system", "be helpful");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "be helpful");
    }
}
