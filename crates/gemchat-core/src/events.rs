//! # Store Events
//!
//! 会话存储的变更通知。界面层订阅后据此重新渲染。

use serde::{Deserialize, Serialize};

/// 通知通道容量
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 存储变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// 当前对话追加了消息
    MessageAppended { len: usize },
    /// 开始等待回复
    ReplyPending { generation: u64 },
    /// 过期的回复被丢弃（对话已经重置）
    StaleReplyDiscarded { generation: u64 },
    /// 开始生成摘要
    SummarizingStarted,
    /// 对话已归档
    SessionArchived { id: String, title: String },
    /// 当前对话被重置为问候语
    ConversationReset { generation: u64 },
    /// 切换了标签页
    TabSwitched { tab: String },
    /// 归档会话被删除
    SessionDeleted { id: String },
    /// 侧边栏开关
    SidebarToggled { open: bool },
    /// 持久化失败（内存状态不受影响）
    PersistFailed { key: String, error: String },
}
