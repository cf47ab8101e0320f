use async_trait::async_trait;

use crate::error::Result;
use crate::transformer::{Completion, PromptRequest};

/// LLM Provider trait
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Get provider metadata
    fn metadata(&self) -> &ProviderMetadata;

    /// Send a single prompt and get the complete response
    async fn generate(&self, request: PromptRequest) -> Result<Completion>;

    /// Validate the provider configuration
    async fn validate(&self) -> Result<()>;
}

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Provider ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Provider capabilities
    pub capabilities: ProviderCapabilities,
}

/// Provider capabilities
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    /// Supports streaming responses
    pub streaming: bool,
    /// Supports multi-turn contents
    pub multi_turn: bool,
}

impl ProviderCapabilities {
    /// Single prompt in, single reply out
    pub fn single_turn() -> Self {
        Self {
            streaming: false,
            multi_turn: false,
        }
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self::single_turn()
    }
}
