use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Nutrition facts as extracted by the vision model. Every field is optional
/// and nutrient amounts are opaque "amount with unit" strings ("10g", "5%");
/// only calories and servings-per-container are numeric. Unknown keys in a
/// model reply are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings_per_container: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturated_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trans_fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_carbohydrates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_fiber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sugars: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_sugars: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iron: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potassium: Option<String>,
    /// Extended mappings some model replies include; passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamins: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minerals: Option<HashMap<String, String>>,
}

/// Structured result of one vision call. `nutrition_data` is only present
/// when the model extracted a label or produced food-based estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisResult {
    pub is_nutrition_label: bool,
    #[serde(default)]
    pub ocr_text: String,
    #[serde(default)]
    pub nutrition_data: Option<NutritionData>,
    #[serde(default)]
    pub food_recognition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One conversation turn. `timestamp` (unix millis) is set on client-side
/// messages only and never interpreted by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(timestamp),
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(timestamp),
        }
    }
}

// --- request/response bodies ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub nutrition_context: Option<NutritionData>,
    #[serde(default)]
    pub conversation_history: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeImageResponse {
    pub success: bool,
    pub data: ImageAnalysisResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}
