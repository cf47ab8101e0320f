//! # Gemchat Core
//!
//! Gemchat 的会话状态管理与本地持久化。
//!
//! ## 功能特性
//!
//! - **当前对话**：只追加的消息列表，新对话总以问候语开头
//! - **归档会话**：开始新会话时生成带标题的只读快照
//! - **标签页**：在当前对话与归档会话之间切换，不丢失进行中的对话
//! - **持久化**：每次变更后同步写入键值存储，损坏的数据视为不存在
//! - **过期回复**：对话重置后到达的回复会被丢弃
//!
//! ## 存储结构
//!
//! ```text
//! <base_path>/
//! ├── chatMessages.json        # 当前对话
//! └── pastChatSessions.json    # 归档会话（最新在前）
//! ```
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use gemchat_core::{JsonFileStore, JsonFileStoreConfig, SessionStore};
//! use std::sync::Arc;
//!
//! let storage = JsonFileStore::new(JsonFileStoreConfig::new("~/.gemchat/data"))?;
//! let mut store = SessionStore::load(Arc::new(storage));
//!
//! if let Some(ticket) = store.append_user_message("Hello!") {
//!     // 调用对话服务 ...
//!     store.complete_reply(&ticket, Ok("Hi there".to_string()));
//! }
//! # Ok::<(), gemchat_core::StorageError>(())
//! ```

pub mod error;
pub mod events;
pub mod json_file_store;
pub mod services;
pub mod shared;
pub mod storage;
pub mod store;
pub mod types;

// 重新导出主要类型
pub use error::{ServiceError, ServiceResult, StorageError, StorageResult};
pub use events::StoreEvent;
pub use json_file_store::{JsonFileStore, JsonFileStoreConfig};
pub use services::{
    ConversationService, SummarizationService, NO_REPLY_FALLBACK, REPLY_ERROR_PLACEHOLDER,
    SUMMARY_ERROR_TITLE, UNTITLED_FALLBACK,
};
pub use shared::SharedSessionStore;
pub use storage::{KeyValueStore, MemoryStore, CONVERSATION_KEY, SESSIONS_KEY};
pub use store::{ArchivalPhase, ArchiveTicket, NewSessionStep, ReplyTicket, SessionStore};
pub use types::{
    flatten_conversation, fresh_conversation, Conversation, Message, Sender, Session, TabId,
    CURRENT_TAB, GREETING, SUMMARY_INPUT_LIMIT,
};

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 创建默认存储路径
pub fn default_storage_path() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".gemchat").join("data"))
        .unwrap_or_else(|| std::path::PathBuf::from("./gemchat_data"))
}
