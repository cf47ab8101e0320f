use async_trait::async_trait;

use crate::error::Result;
use crate::provider::{
    BaseProvider, LLMProvider, ProviderCapabilities, ProviderConfig, ProviderMetadata,
};
use crate::transformer::{Completion, GeminiTransformer, PromptRequest};

/// Google Gemini provider (`generateContent`)
pub struct GeminiProvider {
    base: BaseProvider<GeminiTransformer>,
}

impl GeminiProvider {
    /// Create with custom configuration
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let metadata = ProviderMetadata {
            id: config.provider_id.clone(),
            name: "Google Gemini".to_string(),
            capabilities: ProviderCapabilities::single_turn(),
        };

        let base = BaseProvider::new(config, GeminiTransformer::new(), metadata)?;
        Ok(Self { base })
    }

    /// Create a provider for the default model with the given key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::default().with_api_key(api_key))
    }

    pub fn config(&self) -> &ProviderConfig {
        self.base.config()
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn provider_id(&self) -> &str {
        self.base.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.base.metadata
    }

    async fn generate(&self, request: PromptRequest) -> Result<Completion> {
        self.base.send_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        self.base.validate().await
    }
}
