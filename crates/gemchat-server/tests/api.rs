use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use gemchat_llm::{
    Completion, LLMError, LLMProvider, PromptRequest, ProviderCapabilities, ProviderMetadata,
};
use gemchat_server::{create_router, AppState};

type Responder = Box<dyn Fn() -> Result<Completion, LLMError> + Send + Sync>;

/// Mock provider returning a fixed outcome and recording prompts
struct MockProvider {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(respond: impl Fn() -> Result<Completion, LLMError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn text(text: Option<&str>) -> Self {
        let text = text.map(str::to_string);
        Self::new(move || {
            Ok(Completion {
                text: text.clone(),
                raw: Value::Null,
            })
        })
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn provider_id(&self) -> &str {
        "mock"
    }

    fn metadata(&self) -> &ProviderMetadata {
        use std::sync::OnceLock;
        static METADATA: OnceLock<ProviderMetadata> = OnceLock::new();
        METADATA.get_or_init(|| ProviderMetadata {
            id: "mock".to_string(),
            name: "Mock Provider".to_string(),
            capabilities: ProviderCapabilities::single_turn(),
        })
    }

    async fn generate(&self, request: PromptRequest) -> Result<Completion, LLMError> {
        self.prompts.lock().unwrap().push(request.prompt);
        (self.respond)()
    }

    async fn validate(&self) -> Result<(), LLMError> {
        Ok(())
    }
}

fn app_with(provider: MockProvider) -> (Router, Arc<MockProvider>) {
    let provider = Arc::new(provider);
    (create_router(AppState::new(provider.clone()), true), provider)
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_chat_returns_reply() {
    let (app, provider) = app_with(MockProvider::text(Some("Hi there!")));

    let (status, body) = call(app, Method::POST, "/api/chat", Some(json!({"message": "Hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "Hi there!"}));
    assert_eq!(
        provider.prompts.lock().unwrap().as_slice(),
        ["Answer in maximum 150 words, but concise when you can:\n\nHello"]
    );
}

#[tokio::test]
async fn test_chat_missing_candidate_falls_back() {
    let (app, _) = app_with(MockProvider::text(None));

    let (status, body) = call(app, Method::POST, "/api/chat", Some(json!({"message": "Hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "No reply from Gemini API");
}

#[tokio::test]
async fn test_summarize_flattens_and_trims() {
    let (app, provider) = app_with(MockProvider::text(Some("  Friendly Hello  ")));
    let messages = json!([
        {"text": "Hello! How can I help you today?", "sender": "bot"},
        {"text": "Hi", "sender": "user"}
    ]);

    let (status, body) = call(
        app,
        Method::POST,
        "/api/summarize",
        Some(json!({"messages": messages})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"summary": "Friendly Hello"}));
    let prompts = provider.prompts.lock().unwrap();
    assert!(prompts[0].ends_with("\n\nBot: Hello! How can I help you today?\nUser: Hi"));
}

#[tokio::test]
async fn test_summarize_empty_title_falls_back() {
    let (app, _) = app_with(MockProvider::text(Some("")));

    let (status, body) = call(
        app,
        Method::POST,
        "/api/summarize",
        Some(json!({"messages": [{"text": "Hi", "sender": "user"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Untitled Conversation");
}

#[tokio::test]
async fn test_non_post_is_405() {
    for uri in ["/api/chat", "/api/summarize"] {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let (app, provider) = app_with(MockProvider::text(Some("unused")));
            let (status, body) = call(app, method, uri, None).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, json!({"error": "Method Not Allowed"}));
            assert!(provider.prompts.lock().unwrap().is_empty());
        }
    }
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let (app, _) = app_with(MockProvider::new(|| {
        Err(LLMError::Api {
            status: 403,
            message: "denied".to_string(),
            detail: Some(json!({"code": 403, "message": "denied"})),
        })
    }));

    let (status, body) = call(app, Method::POST, "/api/chat", Some(json!({"message": "Hi"}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": {"code": 403, "message": "denied"}}));
}

#[tokio::test]
async fn test_upstream_status_without_detail() {
    let (app, _) = app_with(MockProvider::new(|| {
        Err(LLMError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
            detail: None,
        })
    }));

    let (status, body) = call(
        app,
        Method::POST,
        "/api/summarize",
        Some(json!({"messages": []})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Gemini API error"}));
}

#[tokio::test]
async fn test_network_failure_is_500() {
    let (app, _) = app_with(MockProvider::new(|| {
        Err(LLMError::Network("connection reset".to_string()))
    }));

    let (status, body) = call(app, Method::POST, "/api/chat", Some(json!({"message": "Hi"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (app, provider) = app_with(MockProvider::text(Some("unused")));

    let (status, body) = call(app, Method::POST, "/api/chat", Some(json!({"msg": "Hi"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(MockProvider::text(None));

    let (status, body) = call(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}
