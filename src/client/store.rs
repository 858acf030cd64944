use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::client::api::{ClientError, NutritionApi};
use crate::client::storage::SessionStorage;
use crate::openai::dto::{ChatMessage, ImageAnalysisResult, NutritionData};

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// One analyzed image plus the chat that follows it. `nutrition_data` and
/// `image_analysis` are fixed at creation; only messages and `updated_at`
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub nutrition_data: Option<NutritionData>,
    pub image_analysis: Option<ImageAnalysisResult>,
    pub messages: Vec<ChatMessage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ChatSession {
    pub fn new(now: i64) -> Self {
        Self {
            id: format!("session-{}", now),
            nutrition_data: None,
            image_analysis: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session state machine. At most one session exists at a time; a new upload
/// replaces it, an explicit clear discards it. The session is written through
/// to storage on every change; `is_analyzing`/`is_sending`/`error` are
/// transient and reset on reload.
pub struct NutritionChatStore {
    api: Arc<dyn NutritionApi>,
    storage: Arc<dyn SessionStorage>,
    session: Option<ChatSession>,
    is_analyzing: bool,
    is_sending: bool,
    error: Option<String>,
}

impl NutritionChatStore {
    pub fn new(api: Arc<dyn NutritionApi>, storage: Arc<dyn SessionStorage>) -> Self {
        let session = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to restore session, starting empty");
                None
            }
        };
        Self {
            api,
            storage,
            session,
            is_analyzing: false,
            is_sending: false,
            error: None,
        }
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Upload an image and start a fresh session from the analysis result.
    /// Any previous session is discarded on success. A second upload while
    /// one is in flight is rejected without touching the current state.
    pub async fn upload_and_analyze_image(
        &mut self,
        file: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ClientError> {
        if self.is_analyzing {
            let err = ClientError::Api("Image analysis already in progress".into());
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.is_analyzing = true;
        self.error = None;

        let api = self.api.clone();
        match api.analyze_image(file, content_type).await {
            Ok(data) => {
                let now = now_millis();
                let session = ChatSession {
                    id: format!("session-{}", now),
                    nutrition_data: data.nutrition_data.clone(),
                    image_analysis: Some(data.clone()),
                    messages: vec![ChatMessage::assistant(initial_assistant_message(&data), now)],
                    created_at: now,
                    updated_at: now,
                };
                self.session = Some(session);
                self.persist();
                self.is_analyzing = false;
                Ok(())
            }
            Err(e) => {
                self.is_analyzing = false;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Send a chat message within the current session. The user message is
    /// appended before the network call resolves; a failed call leaves it in
    /// place and only sets the error.
    pub async fn send_message(&mut self, message: &str) -> Result<(), ClientError> {
        if self.session.is_none() {
            self.error = Some("No active session. Please upload an image first.".into());
            return Ok(());
        }

        // optimistic append, no rollback
        let now = now_millis();
        {
            let session = self.session.as_mut().expect("session checked above");
            session.messages.push(ChatMessage::user(message, now));
            session.updated_at = now;
        }
        self.persist();
        self.is_sending = true;
        self.error = None;

        let (nutrition_data, history) = {
            let session = self.session.as_ref().expect("session checked above");
            (session.nutrition_data.clone(), session.messages.clone())
        };

        let api = self.api.clone();
        match api.chat(message, nutrition_data.as_ref(), &history).await {
            Ok(reply) => {
                let now = now_millis();
                let session = self.session.as_mut().expect("session checked above");
                session.messages.push(ChatMessage::assistant(reply, now));
                session.updated_at = now;
                self.persist();
                self.is_sending = false;
                Ok(())
            }
            Err(e) => {
                self.is_sending = false;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discard the session unconditionally. Safe to call from any state.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.error = None;
        self.is_analyzing = false;
        self.is_sending = false;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn persist(&self) {
        if let Some(session) = &self.session {
            if let Err(e) = self.storage.save(session) {
                warn!(error = %e, "failed to persist session");
            }
        }
    }
}

fn initial_assistant_message(data: &ImageAnalysisResult) -> String {
    if data.is_nutrition_label {
        let follow_up = if data.food_recognition.is_empty() {
            "Ready to answer your questions!"
        } else {
            &data.food_recognition
        };
        format!("I've analyzed the nutrition label. {}", follow_up)
    } else {
        format!(
            "I've identified this as: {}. I can provide estimated nutritional information. What would you like to know?",
            data.food_recognition
        )
    }
}
