use crate::openai::dto::NutritionData;

/// Instruction sent with every vision call. The model is asked to answer with
/// a single JSON object shaped like `ImageAnalysisResult`.
pub const VISION_PROMPT: &str = r#"
Analyze this image carefully.

If this is a nutrition facts label:
1. Extract ALL visible text from the label (OCR)
2. Identify and extract nutrition information in this JSON format:
{
  "servingSize": "amount with unit",
  "servingsPerContainer": number,
  "calories": number,
  "totalFat": "amount with unit",
  "saturatedFat": "amount with unit",
  "transFat": "amount with unit",
  "cholesterol": "amount with unit",
  "sodium": "amount with unit",
  "totalCarbohydrates": "amount with unit",
  "dietaryFiber": "amount with unit",
  "totalSugars": "amount with unit",
  "addedSugars": "amount with unit",
  "protein": "amount with unit",
  "vitaminD": "amount with unit",
  "calcium": "amount with unit",
  "iron": "amount with unit",
  "potassium": "amount with unit"
}

If this is a food dish without a nutrition label:
1. Identify the food/dish by name
2. Provide estimated nutritional information based on typical values for this food
3. Note that these are estimates

Return ONLY a JSON response (no markdown, no code blocks) with this exact structure:
{
  "isNutritionLabel": true or false,
  "ocrText": "all extracted text if nutrition label, empty string otherwise",
  "nutritionData": {nutrition object or null},
  "foodRecognition": "description of the food/dish"
}
"#;

const CHAT_PERSONA: &str = "You are a nutrition expert assistant helping users understand nutrition facts labels according to FDA standards (https://www.fda.gov/food/nutrition-facts-label/how-understand-and-use-nutrition-facts-label).";

const CHAT_RESPONSIBILITIES: &str = "Your responsibilities:
- Provide accurate, helpful answers about nutritional content
- Explain nutrition facts in simple terms
- Reference the FDA Nutrition Facts Label guidelines
- Explain % Daily Values (based on 2,000 calorie diet)
- Offer healthy eating advice when appropriate
- Be concise but informative

When nutrition data is available, always reference it in your answers.";

/// System prompt for the chat model. When nutrition context is known the full
/// structured data is interpolated so replies can cite exact values.
pub fn build_system_prompt(nutrition_context: Option<&NutritionData>) -> String {
    let context_block = nutrition_context
        .and_then(|data| serde_json::to_string_pretty(data).ok())
        .map(|json| format!("Current Nutrition Data Available:\n{}\n", json))
        .unwrap_or_default();

    format!("{}\n\n{}\n{}", CHAT_PERSONA, context_block, CHAT_RESPONSIBILITIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_context_values() {
        let data = NutritionData {
            calories: Some(150.0),
            protein: Some("5g".into()),
            ..Default::default()
        };
        let prompt = build_system_prompt(Some(&data));
        assert!(prompt.contains("150"));
        assert!(prompt.contains("5g"));
        assert!(prompt.contains("Current Nutrition Data Available:"));
    }

    #[test]
    fn test_system_prompt_without_context() {
        let prompt = build_system_prompt(None);
        assert!(!prompt.contains("Current Nutrition Data Available:"));
        assert!(prompt.contains("nutrition expert assistant"));
    }
}
