use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{LLMError, Result};
use crate::provider::{AuthConfig, LLMProvider, ProviderConfig, ProviderMetadata};
use crate::transformer::{Completion, PromptRequest, SchemaTransformer};

/// Base provider implementation
/// Handles common HTTP functionality and delegates schema transformation
///
/// Each call is a single attempt. Failures go straight back to the caller.
pub struct BaseProvider<T: SchemaTransformer> {
    config: ProviderConfig,
    http_client: Client,
    transformer: Arc<T>,
    pub metadata: ProviderMetadata,
}

impl<T: SchemaTransformer + 'static> BaseProvider<T> {
    /// Create a new base provider
    pub fn new(config: ProviderConfig, transformer: T, metadata: ProviderMetadata) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LLMError::Config(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            transformer: Arc::new(transformer),
            metadata,
        })
    }

    /// Get the provider ID
    pub fn provider_id(&self) -> &str {
        self.transformer.provider_id()
    }

    /// Get the config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build request headers
    fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        for (key, value) in &self.config.headers {
            let header_name = header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid header name: {}", e)))?;
            let header_value = header::HeaderValue::from_str(value)
                .map_err(|e| LLMError::Config(format!("Invalid header value: {}", e)))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    fn api_key(&self) -> Result<&str> {
        match &self.config.auth {
            AuthConfig::ApiKey { key } => Ok(key),
            AuthConfig::None => Err(LLMError::Config("API key is not configured".to_string())),
        }
    }

    /// Send a non-streaming request
    pub async fn send_request(&self, request: PromptRequest) -> Result<Completion> {
        let key = self.api_key()?;
        let body = self.transformer.transform_request(&request)?;
        let headers = self.build_headers()?;
        let url = self.transformer.endpoint(&self.config);

        tracing::debug!(
            provider = self.provider_id(),
            model = %self.config.model,
            prompt_chars = request.prompt.chars().count(),
            "Sending generate request"
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", key)])
            .headers(headers)
            .json(&body)
            .send()
            .await
            // reqwest errors embed the URL, which carries the key
            .map_err(|e| LLMError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LLMError::Network(e.without_url().to_string()))?;
        let data: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = data.as_ref().and_then(|d| d.get("error")).cloned();
            let message = detail
                .as_ref()
                .and_then(|d| d.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

            tracing::warn!(status = status.as_u16(), %message, "Upstream returned an error");
            return Err(LLMError::Api {
                status: status.as_u16(),
                message,
                detail,
            });
        }

        let data = data.ok_or_else(|| {
            LLMError::Transform(crate::error::ConversionError::InvalidFormat(
                "response body is not JSON".to_string(),
            ))
        })?;

        Ok(self.transformer.parse_response(&data)?)
    }
}

#[async_trait]
impl<T: SchemaTransformer + 'static> LLMProvider for BaseProvider<T> {
    fn provider_id(&self) -> &str {
        self.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn generate(&self, request: PromptRequest) -> Result<Completion> {
        self.send_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        self.api_key()?;
        let _ = self.build_headers()?;
        Ok(())
    }
}
