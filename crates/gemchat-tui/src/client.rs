use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use gemchat_core::services::{normalize_reply, normalize_title};
use gemchat_core::{
    ConversationService, Message, ServiceError, ServiceResult, SummarizationService,
};

/// HTTP client for the gemchat proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: Option<String>,
}

impl ProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> ServiceResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

/// Pull a readable message out of a proxy `{ "error": ... }` body
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    match value.get("error") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
        None => body.to_string(),
    }
}

#[async_trait]
impl ConversationService for ProxyClient {
    async fn reply(&self, message: &str) -> ServiceResult<String> {
        let body: ChatReply = self.post("/api/chat", &ChatRequest { message }).await?;
        Ok(normalize_reply(body.reply.unwrap_or_default()))
    }
}

#[async_trait]
impl SummarizationService for ProxyClient {
    async fn summarize(&self, messages: &[Message]) -> ServiceResult<String> {
        let body: SummaryReply = self
            .post("/api/summarize", &SummarizeRequest { messages })
            .await?;
        Ok(normalize_title(body.summary.as_deref().unwrap_or_default()))
    }
}
