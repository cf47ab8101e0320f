//! # Shared Session Store
//!
//! 多任务环境下的会话存储包装：所有变更都经过同一把锁串行执行，
//! 网络调用期间不持有锁。

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::events::StoreEvent;
use crate::services::{ConversationService, SummarizationService};
use crate::storage::KeyValueStore;
use crate::store::{NewSessionStep, SessionStore};
use crate::types::{Session, TabId};

/// 可跨任务共享的会话存储
#[derive(Clone)]
pub struct SharedSessionStore {
    inner: Arc<Mutex<SessionStore>>,
}

impl SharedSessionStore {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// 从持久化层加载
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::new(SessionStore::load(storage))
    }

    /// 直接锁住存储。不要跨 `.await` 持有返回的 guard。
    pub fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.inner.lock()
    }

    /// 在锁内读取
    pub fn read<R>(&self, f: impl FnOnce(&SessionStore) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.lock().subscribe()
    }

    /// 发送消息并等待回复。
    ///
    /// 返回 `false` 表示消息没有被接受，或者回复因对话已重置而被丢弃。
    pub async fn send_message(&self, text: &str, service: &dyn ConversationService) -> bool {
        let ticket = {
            let mut store = self.inner.lock();
            store.append_user_message(text)
        };
        let Some(ticket) = ticket else {
            return false;
        };

        let result = service.reply(&ticket.message).await;

        let mut store = self.inner.lock();
        store.complete_reply(&ticket, result)
    }

    /// 归档当前对话并开始新会话
    pub async fn start_new_session(&self, summarizer: &dyn SummarizationService) -> Option<Session> {
        let step = {
            let mut store = self.inner.lock();
            store.begin_new_session()
        };
        let ticket = match step {
            NewSessionStep::Summarize(ticket) => ticket,
            NewSessionStep::Reset | NewSessionStep::Busy => return None,
        };

        let result = summarizer.summarize(&ticket.messages).await;

        let mut store = self.inner.lock();
        store.finish_new_session(&ticket, result)
    }

    pub fn switch_tab(&self, tab: TabId) -> bool {
        self.inner.lock().switch_tab(tab)
    }

    pub fn delete_session(&self, session_id: &str) -> bool {
        self.inner.lock().delete_session(session_id)
    }

    pub fn toggle_sidebar(&self) -> bool {
        self.inner.lock().toggle_sidebar()
    }
}
