//! # Session Store
//!
//! 会话状态的唯一数据源：当前对话、归档会话列表、当前标签页。
//!
//! 这是界面层与持久化层之间的核心组件，负责：
//! - 维护标签页与归档的不变量
//! - 每次变更后同步写入持久化层
//! - 用代数（generation）丢弃过期的网络回复
//! - 通过广播通道通知界面重新渲染
//!
//! 网络调用被拆成 begin / complete 两半，中间不持有任何锁，
//! 所以同一个存储可以放在 [`crate::SharedSessionStore`] 里跨任务共享。

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::ServiceResult;
use crate::events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::services::{
    normalize_reply, normalize_title, ConversationService, SummarizationService,
    REPLY_ERROR_PLACEHOLDER, SUMMARY_ERROR_TITLE,
};
use crate::storage::{load_json, save_json, KeyValueStore, CONVERSATION_KEY, SESSIONS_KEY};
use crate::types::{fresh_conversation, Conversation, Message, Session, TabId, CURRENT_TAB};

/// 归档状态机所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivalPhase {
    /// 正常对话中
    Active,
    /// 正在等待摘要服务
    Summarizing,
}

/// 一次对话服务调用的凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTicket {
    /// 发出请求时的对话代数
    pub generation: u64,
    /// 要发送给对话服务的消息
    pub message: String,
    id: u64,
}

/// 一次摘要服务调用的凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTicket {
    pub generation: u64,
    /// 发起归档时的对话快照（摘要服务的输入）
    pub messages: Conversation,
}

/// `begin_new_session` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSessionStep {
    /// 对话只有问候语，已直接重置，不产生归档
    Reset,
    /// 需要调用摘要服务，完成后调用 `finish_new_session`
    Summarize(ArchiveTicket),
    /// 已经有一次归档在进行中
    Busy,
}

/// 会话存储
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    /// 正在进行的对话，也是回到 "current" 标签页时恢复的内容
    active_conversation: Conversation,
    /// 归档会话，最新的在前
    saved_sessions: Vec<Session>,
    active_tab: TabId,
    sidebar_open: bool,
    phase: ArchivalPhase,
    /// 每次重置对话加一
    generation: u64,
    pending_reply: Option<u64>,
    next_ticket_id: u64,
    events: broadcast::Sender<StoreEvent>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("active_conversation", &self.active_conversation.len())
            .field("saved_sessions", &self.saved_sessions.len())
            .field("active_tab", &self.active_tab)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

impl SessionStore {
    /// 从持久化层恢复状态。缺失或损坏的数据使用默认值。
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let active_conversation = match load_json::<Conversation>(storage.as_ref(), CONVERSATION_KEY)
        {
            Some(messages) if !messages.is_empty() => messages,
            _ => fresh_conversation(),
        };

        let saved_sessions = load_json::<Vec<Session>>(storage.as_ref(), SESSIONS_KEY)
            .map(dedupe_sessions)
            .unwrap_or_default();

        info!(
            "Session store loaded: {} messages, {} saved sessions",
            active_conversation.len(),
            saved_sessions.len()
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            active_conversation,
            saved_sessions,
            active_tab: TabId::Current,
            sidebar_open: false,
            phase: ArchivalPhase::Active,
            generation: 0,
            pending_reply: None,
            next_ticket_id: 0,
            events,
        }
    }

    /// 订阅变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ---------------------------------------------------------------
    // 读取
    // ---------------------------------------------------------------

    pub fn active_conversation(&self) -> &[Message] {
        &self.active_conversation
    }

    pub fn saved_sessions(&self) -> &[Session] {
        &self.saved_sessions
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.saved_sessions.iter().find(|s| s.id == id)
    }

    pub fn active_tab(&self) -> &TabId {
        &self.active_tab
    }

    /// 回到 "current" 时恢复的对话。
    ///
    /// 它就是正在进行的对话本身而不是副本，所以查看归档期间
    /// 到达的回复也不会丢。
    pub fn pinned_snapshot(&self) -> &[Message] {
        &self.active_conversation
    }

    /// 当前标签页显示的对话
    pub fn displayed(&self) -> &[Message] {
        match &self.active_tab {
            TabId::Current => &self.active_conversation,
            TabId::Session(id) => self
                .session(id)
                .map(|s| s.messages.as_slice())
                .unwrap_or(self.active_conversation.as_slice()),
        }
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn phase(&self) -> ArchivalPhase {
        self.phase
    }

    pub fn is_summarizing(&self) -> bool {
        self.phase == ArchivalPhase::Summarizing
    }

    pub fn is_reply_pending(&self) -> bool {
        self.pending_reply.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 是否允许发送：在 "current" 标签页、没有等待中的回复、不在归档中
    pub fn can_send(&self) -> bool {
        self.active_tab.is_current() && self.pending_reply.is_none() && !self.is_summarizing()
    }

    // ---------------------------------------------------------------
    // 对话
    // ---------------------------------------------------------------

    /// 追加用户消息。
    ///
    /// 空白输入、查看归档时、等待回复时或归档进行中都不做任何事，返回 `None`。
    /// 成功时返回调用对话服务所需的凭据。
    pub fn append_user_message(&mut self, text: &str) -> Option<ReplyTicket> {
        if text.trim().is_empty() {
            return None;
        }
        if !self.can_send() {
            debug!(
                "Ignoring send: tab={}, pending={}, phase={:?}",
                self.active_tab,
                self.pending_reply.is_some(),
                self.phase
            );
            return None;
        }

        self.active_conversation.push(Message::user(text));
        self.persist();
        self.emit(StoreEvent::MessageAppended {
            len: self.active_conversation.len(),
        });

        let id = self.next_ticket_id;
        self.next_ticket_id += 1;
        self.pending_reply = Some(id);
        self.emit(StoreEvent::ReplyPending {
            generation: self.generation,
        });

        Some(ReplyTicket {
            generation: self.generation,
            message: text.to_string(),
            id,
        })
    }

    /// 追加机器人消息到正在进行的对话
    pub fn append_bot_message(&mut self, text: impl Into<String>) {
        self.active_conversation.push(Message::bot(text));
        self.persist();
        self.emit(StoreEvent::MessageAppended {
            len: self.active_conversation.len(),
        });
    }

    /// 处理对话服务的结果。
    ///
    /// 失败会变成一条占位消息而不是错误。对话在请求期间被重置过时，
    /// 回复被丢弃并返回 `false`。
    pub fn complete_reply(&mut self, ticket: &ReplyTicket, result: ServiceResult<String>) -> bool {
        if ticket.generation != self.generation {
            info!(
                "Discarding reply from generation {} (now {})",
                ticket.generation, self.generation
            );
            self.emit(StoreEvent::StaleReplyDiscarded {
                generation: ticket.generation,
            });
            return false;
        }

        if self.pending_reply == Some(ticket.id) {
            self.pending_reply = None;
        }

        let text = match result {
            Ok(reply) => normalize_reply(reply),
            Err(e) => {
                warn!("Conversation service failed: {}", e);
                REPLY_ERROR_PLACEHOLDER.to_string()
            }
        };
        self.append_bot_message(text);
        true
    }

    /// 发送一条消息并等待回复（单一所有者时的便捷方法）
    pub async fn send_message(&mut self, text: &str, service: &dyn ConversationService) -> bool {
        let Some(ticket) = self.append_user_message(text) else {
            return false;
        };
        let result = service.reply(&ticket.message).await;
        self.complete_reply(&ticket, result)
    }

    // ---------------------------------------------------------------
    // 归档
    // ---------------------------------------------------------------

    /// 开始新会话：Active → Summarizing，或直接重置。
    pub fn begin_new_session(&mut self) -> NewSessionStep {
        if self.is_summarizing() {
            return NewSessionStep::Busy;
        }

        if self.active_conversation.len() <= 1 {
            debug!("Conversation has only the greeting, resetting without archive");
            self.reset_conversation();
            return NewSessionStep::Reset;
        }

        self.phase = ArchivalPhase::Summarizing;
        self.emit(StoreEvent::SummarizingStarted);

        NewSessionStep::Summarize(ArchiveTicket {
            generation: self.generation,
            messages: self.active_conversation.clone(),
        })
    }

    /// 完成归档：Summarizing → Archived，然后重置对话。
    ///
    /// 摘要失败时使用固定标题，归档本身总会完成。
    pub fn finish_new_session(
        &mut self,
        ticket: &ArchiveTicket,
        result: ServiceResult<String>,
    ) -> Option<Session> {
        if ticket.generation != self.generation || !self.is_summarizing() {
            warn!(
                "Ignoring stale archive ticket from generation {}",
                ticket.generation
            );
            return None;
        }

        let title = match result {
            Ok(title) => normalize_title(&title),
            Err(e) => {
                warn!("Summarization service failed: {}", e);
                SUMMARY_ERROR_TITLE.to_string()
            }
        };

        // 归档时刻的对话：摘要期间到达的回复也包含在内
        let messages = std::mem::take(&mut self.active_conversation);
        let session = Session::archive(title, messages);
        info!(
            "Archived session {} \"{}\" ({} messages)",
            session.id,
            session.title,
            session.len()
        );

        self.saved_sessions.insert(0, session.clone());
        self.emit(StoreEvent::SessionArchived {
            id: session.id.clone(),
            title: session.title.clone(),
        });

        self.reset_conversation();
        Some(session)
    }

    /// 开始新会话并等待摘要（单一所有者时的便捷方法）
    pub async fn start_new_session(
        &mut self,
        summarizer: &dyn SummarizationService,
    ) -> Option<Session> {
        match self.begin_new_session() {
            NewSessionStep::Summarize(ticket) => {
                let result = summarizer.summarize(&ticket.messages).await;
                self.finish_new_session(&ticket, result)
            }
            NewSessionStep::Reset | NewSessionStep::Busy => None,
        }
    }

    /// 退出动作：问候语对话、回到 "current"、代数加一
    fn reset_conversation(&mut self) {
        self.active_conversation = fresh_conversation();
        self.active_tab = TabId::Current;
        self.phase = ArchivalPhase::Active;
        self.pending_reply = None;
        self.generation += 1;
        self.persist();
        self.emit(StoreEvent::ConversationReset {
            generation: self.generation,
        });
    }

    // ---------------------------------------------------------------
    // 标签页
    // ---------------------------------------------------------------

    /// 切换标签页并关闭侧边栏。目标会话不存在时不做任何事。
    pub fn switch_tab(&mut self, tab: TabId) -> bool {
        if let TabId::Session(id) = &tab {
            if self.session(id).is_none() {
                warn!("Cannot switch to unknown session {}", id);
                return false;
            }
        }

        self.active_tab = tab;
        self.sidebar_open = false;
        self.persist();
        self.emit(StoreEvent::TabSwitched {
            tab: self.active_tab.to_string(),
        });
        self.emit(StoreEvent::SidebarToggled { open: false });
        true
    }

    /// 删除归档会话（幂等）。
    ///
    /// 删除的正是当前查看的会话时，回到 "current"。
    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.saved_sessions.len();
        self.saved_sessions.retain(|s| s.id != session_id);
        let removed = self.saved_sessions.len() != before;

        self.persist();

        if removed {
            info!("Deleted session {}", session_id);
            self.emit(StoreEvent::SessionDeleted {
                id: session_id.to_string(),
            });

            if self.active_tab == TabId::session(session_id) {
                self.active_tab = TabId::Current;
                self.emit(StoreEvent::TabSwitched {
                    tab: CURRENT_TAB.to_string(),
                });
            }
        }
        removed
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.emit(StoreEvent::SidebarToggled {
            open: self.sidebar_open,
        });
        self.sidebar_open
    }

    // ---------------------------------------------------------------
    // 内部
    // ---------------------------------------------------------------

    /// 写入两个键。失败只记录日志。
    fn persist(&self) {
        if let Err(e) = save_json(
            self.storage.as_ref(),
            CONVERSATION_KEY,
            &self.active_conversation,
        ) {
            self.persist_failed(CONVERSATION_KEY, e.to_string());
        }
        if let Err(e) = save_json(self.storage.as_ref(), SESSIONS_KEY, &self.saved_sessions) {
            self.persist_failed(SESSIONS_KEY, e.to_string());
        }
    }

    fn persist_failed(&self, key: &str, error: String) {
        warn!("Failed to persist {}: {}", key, error);
        self.emit(StoreEvent::PersistFailed {
            key: key.to_string(),
            error,
        });
    }

    fn emit(&self, event: StoreEvent) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(event);
    }
}

/// 去掉重复 ID 和保留 ID，保留第一次出现的会话
fn dedupe_sessions(sessions: Vec<Session>) -> Vec<Session> {
    let mut seen = HashSet::new();
    let total = sessions.len();
    let kept: Vec<Session> = sessions
        .into_iter()
        .filter(|s| s.id != CURRENT_TAB && seen.insert(s.id.clone()))
        .collect();

    if kept.len() != total {
        warn!(
            "Dropped {} persisted sessions with duplicate or reserved ids",
            total - kept.len()
        );
    }
    kept
}
