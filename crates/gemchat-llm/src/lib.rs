//! Gemini access for gemchat.
//!
//! A [`BaseProvider`] owns the HTTP client and delegates wire format to a
//! [`SchemaTransformer`]. [`GeminiChat`] layers the chat and titling prompts
//! on top and implements the service traits from `gemchat-core`.

pub mod chat;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod transformer;

// Re-export core types
pub use chat::GeminiChat;
pub use error::{ConversionError, LLMError, Result};
pub use provider::{
    AuthConfig, BaseProvider, LLMProvider, ProviderCapabilities, ProviderConfig, ProviderMetadata,
};
pub use providers::GeminiProvider;
pub use transformer::{Completion, GeminiTransformer, PromptRequest, SchemaTransformer};
