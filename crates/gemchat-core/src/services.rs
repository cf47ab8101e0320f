//! # External Services
//!
//! 对话服务与摘要服务的边界。两者都是无状态的单次请求/响应调用：
//! 不重试，不流式，失败时由调用方替换为固定的备用文本。

use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::types::Message;

/// 上游响应里没有回复文本时使用的回复
pub const NO_REPLY_FALLBACK: &str = "No reply from Gemini API";

/// 摘要为空时使用的标题
pub const UNTITLED_FALLBACK: &str = "Untitled Conversation";

/// 对话服务调用失败时追加到对话里的占位消息
pub const REPLY_ERROR_PLACEHOLDER: &str = "Error getting response.";

/// 摘要服务调用失败时使用的标题
pub const SUMMARY_ERROR_TITLE: &str = "Error Summarizing";

/// 对话服务：发送一条用户消息，返回一条回复
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn reply(&self, message: &str) -> ServiceResult<String>;
}

/// 摘要服务：根据完整对话生成简短标题
#[async_trait]
pub trait SummarizationService: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> ServiceResult<String>;
}

/// 把成功的回复规范化：空回复替换为备用文本，其余原样保留
pub fn normalize_reply(reply: String) -> String {
    if reply.is_empty() {
        NO_REPLY_FALLBACK.to_string()
    } else {
        reply
    }
}

/// 把成功的摘要规范化：去掉首尾空白，空标题替换为备用标题
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_FALLBACK.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reply() {
        assert_eq!(normalize_reply(String::new()), NO_REPLY_FALLBACK);
        assert_eq!(normalize_reply("  ".to_string()), "  ");
        assert_eq!(normalize_reply("Sure!".to_string()), "Sure!");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(""), UNTITLED_FALLBACK);
        assert_eq!(normalize_title(" Trip Planning\n"), "Trip Planning");
    }
}
