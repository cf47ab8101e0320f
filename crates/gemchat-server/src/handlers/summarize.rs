use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use gemchat_core::Message;
use gemchat_llm::prompts::summary_input;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// POST /api/summarize
///
/// 对话先展开为 `User:`/`Bot:` 文本并截取前 1000 个字符，再请求标题。
pub async fn summarize_handler(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let Json(req) = payload?;

    tracing::debug!(messages = req.messages.len(), "Processing summarize request");

    let summary = state
        .chat
        .summarize_text(&summary_input(&req.messages))
        .await?;
    Ok(Json(SummarizeResponse { summary }))
}
