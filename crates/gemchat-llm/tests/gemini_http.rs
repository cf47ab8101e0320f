use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

use gemchat_llm::{GeminiProvider, LLMError, LLMProvider, PromptRequest, ProviderConfig};

fn provider_for(server: &mockito::ServerGuard) -> GeminiProvider {
    let config = ProviderConfig::new("gemini", server.url())
        .with_api_key("test-key")
        .with_timeout(Duration::from_secs(5));
    GeminiProvider::with_config(config).unwrap()
}

#[tokio::test]
async fn test_generate_sends_key_and_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/gemini-2.0-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::Json(
            json!({"contents": [{"parts": [{"text": "ping"}]}]}),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"candidates": [{"content": {"parts": [{"text": "pong"}]}}]}).to_string(),
        )
        .create_async()
        .await;

    let completion = provider_for(&server)
        .generate(PromptRequest::new("ping"))
        .await
        .unwrap();

    assert_eq!(completion.text.as_deref(), Some("pong"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_generate_passes_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/gemini-2.0-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}})
                .to_string(),
        )
        .create_async()
        .await;

    let err = provider_for(&server)
        .generate(PromptRequest::new("ping"))
        .await
        .unwrap_err();

    match err {
        LLMError::Api {
            status,
            message,
            detail,
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid");
            assert_eq!(detail.unwrap()["status"], "INVALID_ARGUMENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_non_json_error_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/gemini-2.0-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;

    let err = provider_for(&server)
        .generate(PromptRequest::new("ping"))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Api { status: 503, detail: None, .. }));
}

#[tokio::test]
async fn test_missing_key_fails_validation() {
    let provider = GeminiProvider::with_config(ProviderConfig::default()).unwrap();
    assert!(matches!(provider.validate().await, Err(LLMError::Config(_))));
    assert!(matches!(
        provider.generate(PromptRequest::new("ping")).await,
        Err(LLMError::Config(_))
    ));
}
