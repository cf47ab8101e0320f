use std::sync::Arc;

use gemchat_llm::{GeminiChat, LLMProvider};

/// 应用状态 - 所有 handler 共享同一个 provider
#[derive(Clone)]
pub struct AppState {
    pub chat: GeminiChat,
}

impl AppState {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            chat: GeminiChat::new(provider),
        }
    }
}
