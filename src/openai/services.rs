use tracing::info;

use crate::error::ApiError;
use crate::openai::client::{ApiMessage, ContentPart};
use crate::openai::dto::{ChatMessage, ImageAnalysisResult, NutritionData};
use crate::openai::prompts::{build_system_prompt, VISION_PROMPT};
use crate::state::AppState;

const VISION_MAX_TOKENS: u32 = 2000;
// Low temperature: extraction should be faithful, not creative.
const VISION_TEMPERATURE: f32 = 0.2;

const CHAT_MAX_TOKENS: u32 = 800;
const CHAT_TEMPERATURE: f32 = 0.7;

/// Analyze a nutrition label or food photo with the vision model.
///
/// `image_base64` must be the preprocessed JPEG bytes, base64-encoded. The
/// model is prompted to reply with one JSON object; the reply is recovered
/// via best-effort brace extraction since the plain completions endpoint
/// gives no schema guarantee.
pub async fn analyze_nutrition_image(
    st: &AppState,
    image_base64: &str,
) -> Result<ImageAnalysisResult, ApiError> {
    info!("analyzing nutrition image with vision model");

    let data_url = format!("data:image/jpeg;base64,{}", image_base64);
    let messages = vec![ApiMessage::parts(
        "user",
        vec![
            ContentPart::text(VISION_PROMPT),
            ContentPart::image_url(data_url, "high"),
        ],
    )];

    let content = st
        .completions
        .complete(
            &st.config.openai.vision_model,
            messages,
            VISION_MAX_TOKENS,
            VISION_TEMPERATURE,
        )
        .await?;

    info!("received response from vision model");
    parse_analysis_reply(&content)
}

/// Best-effort recovery of the `ImageAnalysisResult` JSON object from a
/// free-text model reply (prose and markdown fences are tolerated).
pub fn parse_analysis_reply(content: &str) -> Result<ImageAnalysisResult, ApiError> {
    let json = extract_json_object(content).ok_or_else(|| {
        ApiError::UpstreamFormat("no JSON object found in model reply".into())
    })?;
    serde_json::from_str(json).map_err(|e| ApiError::UpstreamFormat(e.to_string()))
}

/// Returns the first balanced `{...}` span in `text`, respecting JSON string
/// literals and escapes. None when no complete object is present.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Answer a user message with the chat model, grounding the system prompt in
/// the session's nutrition data and replaying prior turns in order.
pub async fn chat_with_nutrition_context(
    st: &AppState,
    message: &str,
    nutrition_context: Option<&NutritionData>,
    conversation_history: &[ChatMessage],
) -> Result<String, ApiError> {
    info!("processing chat message with nutrition context");

    let mut messages =
        Vec::with_capacity(conversation_history.len() + 2);
    messages.push(ApiMessage::text(
        "system",
        build_system_prompt(nutrition_context),
    ));
    for turn in conversation_history {
        messages.push(ApiMessage::text(turn.role.as_str(), turn.content.clone()));
    }
    messages.push(ApiMessage::text("user", message));

    let reply = st
        .completions
        .complete(
            &st.config.openai.chat_model,
            messages,
            CHAT_MAX_TOKENS,
            CHAT_TEMPERATURE,
        )
        .await?;

    info!("received chat response");
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::config::{AppConfig, OpenAiConfig};
    use crate::openai::client::CompletionClient;

    struct FakeCompletion {
        reply: Result<String, String>,
        calls: Mutex<Vec<(String, serde_json::Value, u32, f32)>>,
    }

    impl FakeCompletion {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        async fn complete(
            &self,
            model: &str,
            messages: Vec<ApiMessage>,
            max_tokens: u32,
            temperature: f32,
        ) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push((
                model.to_string(),
                serde_json::to_value(&messages).unwrap(),
                max_tokens,
                temperature,
            ));
            self.reply.clone().map_err(ApiError::Network)
        }
    }

    fn test_state(fake: Arc<FakeCompletion>) -> AppState {
        let config = Arc::new(AppConfig {
            openai: OpenAiConfig {
                api_key: "test-key".into(),
                base_url: "http://localhost:0/v1".into(),
                vision_model: "vision-model".into(),
                chat_model: "chat-model".into(),
                timeout_seconds: 5,
            },
            port: 0,
            cors_origin: "*".into(),
            environment: "test".into(),
        });
        AppState::from_parts(config, fake)
    }

    #[test]
    fn test_extract_json_object_from_fenced_prose() {
        let reply = "Here is the result:\n```json\n{\"isNutritionLabel\":true,\"ocrText\":\"...\",\"nutritionData\":{\"calories\":200},\"foodRecognition\":\"\"}\n```\nThanks";
        let json = extract_json_object(reply).unwrap();
        assert!(json.starts_with('{') && json.ends_with('}'));

        let parsed = parse_analysis_reply(reply).unwrap();
        assert!(parsed.is_nutrition_label);
        assert_eq!(parsed.nutrition_data.unwrap().calories, Some(200.0));
    }

    #[test]
    fn test_extract_json_object_respects_braces_in_strings() {
        let reply = r#"{"foodRecognition":"a {weird} dish","isNutritionLabel":false}"#;
        assert_eq!(extract_json_object(reply), Some(reply));
    }

    #[test]
    fn test_extract_json_object_none_without_braces() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("only opens {"), None);
    }

    #[test]
    fn test_parse_analysis_reply_format_errors() {
        assert!(matches!(
            parse_analysis_reply("sorry, I cannot help"),
            Err(ApiError::UpstreamFormat(_))
        ));
        assert!(matches!(
            parse_analysis_reply(r#"{"isNutritionLabel":"not-a-bool"}"#),
            Err(ApiError::UpstreamFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_sends_multimodal_message_with_vision_params() {
        let fake = FakeCompletion::replying(
            r#"{"isNutritionLabel":true,"ocrText":"Calories 200","nutritionData":{"calories":200},"foodRecognition":"cereal"}"#,
        );
        let st = test_state(fake.clone());

        let result = analyze_nutrition_image(&st, "QUJD").await.unwrap();
        assert!(result.is_nutrition_label);
        assert_eq!(result.ocr_text, "Calories 200");

        let calls = fake.calls.lock().unwrap();
        let (model, messages, max_tokens, temperature) = &calls[0];
        assert_eq!(model, "vision-model");
        assert_eq!(*max_tokens, 2000);
        assert!((temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][1]["image_url"]["detail"], "high");
        assert_eq!(
            messages[0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[tokio::test]
    async fn test_chat_message_order_and_params() {
        let fake = FakeCompletion::replying("protein is 5g per serving");
        let st = test_state(fake.clone());

        let data = NutritionData {
            calories: Some(150.0),
            protein: Some("5g".into()),
            ..Default::default()
        };
        let history = vec![
            ChatMessage::assistant("I've analyzed the nutrition label.", 1),
            ChatMessage::user("is it healthy?", 2),
            ChatMessage::assistant("fairly balanced", 3),
        ];

        let reply =
            chat_with_nutrition_context(&st, "how much protein?", Some(&data), &history)
                .await
                .unwrap();
        assert_eq!(reply, "protein is 5g per serving");

        let calls = fake.calls.lock().unwrap();
        let (model, messages, max_tokens, temperature) = &calls[0];
        assert_eq!(model, "chat-model");
        assert_eq!(*max_tokens, 800);
        assert!((temperature - 0.7).abs() < f32::EPSILON);

        assert_eq!(messages[0]["role"], "system");
        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("150"));
        assert!(system.contains("5g"));

        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[3]["role"], "assistant");
        assert_eq!(messages[4]["role"], "user");
        assert_eq!(messages[4]["content"], "how much protein?");
    }

    #[tokio::test]
    async fn test_chat_without_context_or_history() {
        let fake = FakeCompletion::replying("hello");
        let st = test_state(fake.clone());

        chat_with_nutrition_context(&st, "hi", None, &[])
            .await
            .unwrap();

        let calls = fake.calls.lock().unwrap();
        let (_, messages, _, _) = &calls[0];
        assert_eq!(messages.as_array().unwrap().len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
    }
}
