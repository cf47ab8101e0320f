pub mod gemini;
pub mod utils;

pub use gemini::GeminiTransformer;

use serde_json::Value;

use crate::error::ConversionError;
use crate::provider::ProviderConfig;

/// Single-turn text prompt sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Parsed provider response
#[derive(Debug, Clone)]
pub struct Completion {
    /// First candidate text, if the response had one
    pub text: Option<String>,
    /// Raw response body
    pub raw: Value,
}

/// Schema transformer trait for converting between internal and provider formats
pub trait SchemaTransformer: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Endpoint URL for a non-streaming call (without credentials)
    fn endpoint(&self, config: &ProviderConfig) -> String;

    /// Transform request to provider-specific format
    fn transform_request(&self, request: &PromptRequest) -> Result<Value, ConversionError>;

    /// Parse a complete response (non-streaming)
    fn parse_response(&self, data: &Value) -> Result<Completion, ConversionError>;
}
