use async_trait::async_trait;
use std::sync::Arc;

use gemchat_core::services::{normalize_reply, normalize_title};
use gemchat_core::{ConversationService, Message, ServiceResult, SummarizationService};

use crate::error::Result;
use crate::prompts::{chat_prompt, summary_input, summary_prompt};
use crate::provider::LLMProvider;
use crate::transformer::PromptRequest;

/// Chat and titling on top of any [`LLMProvider`].
///
/// Used by the proxy handlers and by the TUI when it talks to Gemini directly.
#[derive(Clone)]
pub struct GeminiChat {
    provider: Arc<dyn LLMProvider>,
}

impl GeminiChat {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Reply to a single message. An empty candidate becomes the no-reply fallback.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let completion = self
            .provider
            .generate(PromptRequest::new(chat_prompt(message)))
            .await?;
        Ok(normalize_reply(completion.text.unwrap_or_default()))
    }

    /// Title for already-flattened conversation text
    pub async fn summarize_text(&self, text: &str) -> Result<String> {
        let completion = self
            .provider
            .generate(PromptRequest::new(summary_prompt(text)))
            .await?;
        Ok(normalize_title(completion.text.as_deref().unwrap_or_default()))
    }
}

#[async_trait]
impl ConversationService for GeminiChat {
    async fn reply(&self, message: &str) -> ServiceResult<String> {
        Ok(self.chat(message).await?)
    }
}

#[async_trait]
impl SummarizationService for GeminiChat {
    async fn summarize(&self, messages: &[Message]) -> ServiceResult<String> {
        Ok(self.summarize_text(&summary_input(messages)).await?)
    }
}
