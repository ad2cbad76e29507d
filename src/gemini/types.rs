//! Wire types for the Gemini `generateContent` endpoint

use crate::recipe::Difficulty;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Structured output schema: an array of recipe objects, every field required
pub fn response_schema() -> Value {
    let difficulties: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING", "description": "Recipe name." },
                "description": { "type": "STRING", "description": "Short creative description." },
                "prepTime": { "type": "STRING", "description": "Total preparation time, e.g. \"25 min\" or \"1 hour\"." },
                "difficulty": { "type": "STRING", "enum": difficulties },
                "servings": { "type": "INTEGER", "description": "Number of servings." },
                "ingredients": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Ingredients with quantities, e.g. \"200g chicken\"."
                },
                "steps": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Detailed preparation steps (at least 3)."
                },
                "tip": { "type": "STRING", "description": "A useful tip or optional variation." }
            },
            "required": [
                "name", "description", "prepTime", "difficulty",
                "servings", "ingredients", "steps", "tip"
            ]
        }
    })
}
