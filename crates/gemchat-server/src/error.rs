//! HTTP 错误响应
//!
//! 所有错误都以 `{ "error": ... }` 的形式返回。上游返回的错误对象原样透传，
//! 其余失败只暴露固定文本，细节写入日志。

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use gemchat_llm::LLMError;

pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const UPSTREAM_ERROR: &str = "Gemini API error";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("bad request: {0}")]
    BadRequest(String),

    /// 上游非 2xx：沿用上游状态码
    #[error("upstream error: {status}")]
    Upstream { status: u16, detail: Option<Value> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LLMError> for ApiError {
    fn from(e: LLMError) -> Self {
        match e {
            LLMError::Api { status, detail, .. } => Self::Upstream { status, detail },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, Value::from(METHOD_NOT_ALLOWED))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, Value::from(message)),
            ApiError::Upstream { status, detail } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, detail.unwrap_or_else(|| Value::from(UPSTREAM_ERROR)))
            }
            ApiError::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, Value::from(INTERNAL_ERROR))
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// 非 POST 请求的 fallback
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
