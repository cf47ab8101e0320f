use serde::Serialize;
use serde_json::Value;

use crate::error::ConversionError;
use crate::provider::ProviderConfig;
use crate::transformer::utils::safe_get_str;
use crate::transformer::{Completion, PromptRequest, SchemaTransformer};

/// Gemini `generateContent` schema transformer
pub struct GeminiTransformer;

impl GeminiTransformer {
    /// Create a new Gemini transformer
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeminiTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl SchemaTransformer for GeminiTransformer {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn endpoint(&self, config: &ProviderConfig) -> String {
        format!(
            "{}/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        )
    }

    fn transform_request(&self, request: &PromptRequest) -> Result<Value, ConversionError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
        };
        Ok(serde_json::to_value(body)?)
    }

    fn parse_response(&self, data: &Value) -> Result<Completion, ConversionError> {
        if !data.is_object() {
            return Err(ConversionError::InvalidFormat(
                "expected a JSON object".to_string(),
            ));
        }

        let text = safe_get_str(data, "candidates.0.content.parts.0.text").map(str::to_string);

        Ok(Completion {
            text,
            raw: data.clone(),
        })
    }
}
