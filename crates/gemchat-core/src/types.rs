//! # Gemchat Types
//!
//! 定义会话相关的核心类型：消息、对话、归档会话和标签页标识。
//!
//! 持久化的 JSON 形状与浏览器版本保持一致：
//! `{"text": "...", "sender": "user"}`。

use chrono::Local;
use serde::{Deserialize, Serialize};

/// 新对话的开场问候语
pub const GREETING: &str = "Hello! How can I help you today?";

/// "当前对话" 标签页的保留标识
pub const CURRENT_TAB: &str = "current";

/// 摘要输入的字符上限（按字符计，不按字节）
pub const SUMMARY_INPUT_LIMIT: usize = 1000;

/// 消息发送方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// 单条消息，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    /// 创建用户消息
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    /// 创建机器人消息
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }

    /// 开场问候语
    pub fn greeting() -> Self {
        Self::bot(GREETING)
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// 一段对话：按时间顺序排列的消息
pub type Conversation = Vec<Message>;

/// 只包含问候语的新对话
pub fn fresh_conversation() -> Conversation {
    vec![Message::greeting()]
}

/// 将对话展开为 `User: ...` / `Bot: ...` 文本，并截取前 `limit` 个字符。
///
/// 截取从最早的内容开始保留。
pub fn flatten_conversation(messages: &[Message], limit: usize) -> String {
    let flattened = messages
        .iter()
        .map(|m| match m.sender {
            Sender::User => format!("User: {}", m.text),
            Sender::Bot => format!("Bot: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n");

    match flattened.char_indices().nth(limit) {
        Some((byte_idx, _)) => flattened[..byte_idx].to_string(),
        None => flattened,
    }
}

/// 归档会话：结束对话时生成的只读快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// 创建时间（本地时间的展示字符串）
    pub timestamp: String,
    pub title: String,
    pub messages: Conversation,
}

impl Session {
    /// 以新的唯一 ID 和当前时间创建归档会话
    pub fn archive(title: impl Into<String>, messages: Conversation) -> Self {
        Self {
            id: new_session_id(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            title: title.into(),
            messages,
        }
    }

    /// 消息数量
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// 生成会话 ID。v4 UUID 不会与 `CURRENT_TAB` 冲突。
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 当前显示的标签页
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TabId {
    /// 正在进行的对话
    #[default]
    Current,
    /// 某个归档会话
    Session(String),
}

impl TabId {
    pub fn session(id: impl Into<String>) -> Self {
        Self::Session(id.into())
    }

    pub fn is_current(&self) -> bool {
        matches!(self, TabId::Current)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TabId::Current => CURRENT_TAB,
            TabId::Session(id) => id,
        }
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        if value == CURRENT_TAB {
            TabId::Current
        } else {
            TabId::Session(value.to_string())
        }
    }
}
