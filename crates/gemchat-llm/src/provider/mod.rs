pub mod base;
pub mod config;
pub mod metadata;

pub use base::BaseProvider;
pub use config::{AuthConfig, ProviderConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use metadata::{LLMProvider, ProviderCapabilities, ProviderMetadata};
