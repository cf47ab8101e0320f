use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Authentication configuration enum
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API key passed as the `key` query parameter (Gemini style)
    ApiKey {
        /// The API key
        key: String,
    },
    /// No authentication
    #[default]
    None,
}

// The key must never end up in logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { .. } => f.write_str("ApiKey { key: \"***\" }"),
            Self::None => f.write_str("None"),
        }
    }
}

impl AuthConfig {
    /// Create API key auth from environment variable
    pub fn from_env(env_var: &str) -> Option<Self> {
        std::env::var(env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::ApiKey { key })
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::ApiKey { .. })
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider ID
    pub provider_id: String,
    /// Base URL for the API, up to and including the `models` segment
    pub base_url: String,
    /// Authentication configuration
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Additional headers to include
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            auth: AuthConfig::None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: default_timeout(),
            headers: HashMap::new(),
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey { key: key.into() };
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("gemini", DEFAULT_GEMINI_BASE_URL)
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider_id, "gemini");
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(!config.auth.is_configured());
    }

    #[test]
    fn test_debug_hides_key() {
        let config = ProviderConfig::default().with_api_key("secret-key");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-key"));
        assert!(config.auth.is_configured());
    }

    #[test]
    fn test_serde_roundtrip_flattened_auth() {
        let config = ProviderConfig::default()
            .with_api_key("k")
            .with_timeout(Duration::from_secs(5));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], "api_key");
        assert_eq!(value["timeout"], 5);

        let back: ProviderConfig = serde_json::from_value(value).unwrap();
        assert!(matches!(back.auth, AuthConfig::ApiKey { ref key } if key == "k"));
    }

    #[test]
    fn test_from_env_ignores_blank() {
        std::env::set_var("GEMCHAT_TEST_BLANK_KEY", "  ");
        assert!(AuthConfig::from_env("GEMCHAT_TEST_BLANK_KEY").is_none());
        std::env::remove_var("GEMCHAT_TEST_BLANK_KEY");
        assert!(AuthConfig::from_env("GEMCHAT_TEST_BLANK_KEY").is_none());
    }
}
