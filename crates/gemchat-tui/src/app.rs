use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};

use gemchat_core::{
    ConversationService, NewSessionStep, SharedSessionStore, StoreEvent, SummarizationService,
    TabId,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Direct,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "● Proxy"),
            ConnectionStatus::Disconnected => write!(f, "○ Proxy unreachable"),
            ConnectionStatus::Direct => write!(f, "● Gemini (direct)"),
        }
    }
}

/// Which pane receives key presses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Input,
    Sidebar,
}

/// One row of the side panel. Row 0 is always the live conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub tab: TabId,
    pub title: String,
    pub timestamp: Option<String>,
}

pub struct App {
    pub store: SharedSessionStore,
    conversation: Arc<dyn ConversationService>,
    summarizer: Arc<dyn SummarizationService>,
    events: broadcast::Receiver<StoreEvent>,
    pub input: String,
    pub focus: Focus,
    pub sidebar_selected: usize,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll_offset: u16,
    pub status: ConnectionStatus,
    pub notice: Option<String>,
    pub tick: u64,
}

impl App {
    pub fn new(
        store: SharedSessionStore,
        conversation: Arc<dyn ConversationService>,
        summarizer: Arc<dyn SummarizationService>,
        status: ConnectionStatus,
    ) -> Self {
        let events = store.subscribe();
        Self {
            store,
            conversation,
            summarizer,
            events,
            input: String::new(),
            focus: Focus::Input,
            sidebar_selected: 0,
            scroll_offset: 0,
            status,
            notice: None,
            tick: 0,
        }
    }

    /// Send the input line.
    ///
    /// The user message is appended right away; the reply is fetched on a
    /// background task and lands through the store's ticket check. Input the
    /// store refuses (blank, archived tab, reply pending, summarizing) stays in
    /// the box.
    pub fn send_message(&mut self) {
        let ticket = self.store.lock().append_user_message(&self.input);
        let Some(ticket) = ticket else {
            return;
        };
        self.input.clear();
        self.scroll_offset = 0;

        let store = self.store.clone();
        let service = self.conversation.clone();
        tokio::spawn(async move {
            let result = service.reply(&ticket.message).await;
            if let Err(e) = &result {
                tracing::warn!("Conversation service failed: {}", e);
            }
            store.lock().complete_reply(&ticket, result);
        });
    }

    /// Archive the current conversation (if it has content) and start fresh
    pub fn new_session(&mut self) {
        let step = self.store.lock().begin_new_session();
        match step {
            NewSessionStep::Reset => {
                self.notice = Some("Started a new conversation".to_string());
            }
            NewSessionStep::Busy => {
                self.notice = Some("Already archiving, please wait".to_string());
            }
            NewSessionStep::Summarize(ticket) => {
                let store = self.store.clone();
                let summarizer = self.summarizer.clone();
                tokio::spawn(async move {
                    let result = summarizer.summarize(&ticket.messages).await;
                    if let Err(e) = &result {
                        tracing::warn!("Summarization service failed: {}", e);
                    }
                    store.lock().finish_new_session(&ticket, result);
                });
            }
        }
        self.scroll_offset = 0;
    }

    pub fn toggle_sidebar(&mut self) {
        let open = self.store.toggle_sidebar();
        self.focus = if open { Focus::Sidebar } else { Focus::Input };
        if open {
            self.select_active_tab();
        }
    }

    pub fn sidebar_entries(&self) -> Vec<SidebarEntry> {
        self.store.read(|store| {
            std::iter::once(SidebarEntry {
                tab: TabId::Current,
                title: "Current Chat".to_string(),
                timestamp: None,
            })
            .chain(store.saved_sessions().iter().map(|s| SidebarEntry {
                tab: TabId::session(s.id.clone()),
                title: s.title.clone(),
                timestamp: Some(s.timestamp.clone()),
            }))
            .collect()
        })
    }

    fn select_active_tab(&mut self) {
        let active = self.store.read(|s| s.active_tab().clone());
        self.sidebar_selected = self
            .sidebar_entries()
            .iter()
            .position(|e| e.tab == active)
            .unwrap_or(0);
    }

    pub fn select_next(&mut self) {
        let len = self.sidebar_entries().len();
        if self.sidebar_selected + 1 < len {
            self.sidebar_selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
    }

    /// Switch to the highlighted tab; the store closes the panel
    pub fn activate_selected(&mut self) {
        if let Some(entry) = self.sidebar_entries().get(self.sidebar_selected) {
            self.store.switch_tab(entry.tab.clone());
        }
        if !self.store.read(|s| s.is_sidebar_open()) {
            self.focus = Focus::Input;
        }
        self.scroll_offset = 0;
    }

    /// Delete the highlighted archived session. "Current Chat" cannot be deleted.
    pub fn delete_selected(&mut self) {
        let entries = self.sidebar_entries();
        if let Some(SidebarEntry {
            tab: TabId::Session(id),
            ..
        }) = entries.get(self.sidebar_selected)
        {
            self.store.delete_session(id);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.sidebar_entries().len();
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    /// Drain store notifications
    pub fn process_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} store events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn apply_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::MessageAppended { .. } | StoreEvent::ConversationReset { .. } => {
                self.scroll_offset = 0;
            }
            StoreEvent::SessionArchived { title, .. } => {
                self.notice = Some(format!("Archived: {}", title));
                self.clamp_selection();
            }
            StoreEvent::SessionDeleted { .. } => {
                self.notice = Some("Session deleted".to_string());
                self.clamp_selection();
            }
            StoreEvent::SidebarToggled { open } => {
                if !open {
                    self.focus = Focus::Input;
                }
            }
            StoreEvent::PersistFailed { key, error } => {
                self.notice = Some(format!("Could not save {}: {}", key, error));
            }
            StoreEvent::StaleReplyDiscarded { .. } => {
                self.notice = Some("A late reply was dropped".to_string());
            }
            StoreEvent::ReplyPending { .. }
            | StoreEvent::SummarizingStarted
            | StoreEvent::TabSwitched { .. } => {}
        }
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gemchat_core::{
        Message, MemoryStore, ServiceResult, GREETING, REPLY_ERROR_PLACEHOLDER,
    };
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl ConversationService for Echo {
        async fn reply(&self, message: &str) -> ServiceResult<String> {
            Ok(format!("echo: {}", message))
        }
    }

    #[async_trait]
    impl SummarizationService for Echo {
        async fn summarize(&self, _messages: &[Message]) -> ServiceResult<String> {
            Ok("Echo Chat".to_string())
        }
    }

    fn app() -> App {
        let store = SharedSessionStore::load(Arc::new(MemoryStore::new()));
        let echo = Arc::new(Echo);
        App::new(store, echo.clone(), echo, ConnectionStatus::Direct)
    }

    async fn settle(app: &App) {
        for _ in 0..50 {
            let busy = app
                .store
                .read(|s| s.is_reply_pending() || s.is_summarizing());
            if !busy {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_send_appends_and_replies() {
        let mut app = app();
        app.input = "Hi".to_string();

        app.send_message();
        assert!(app.input.is_empty());
        settle(&app).await;

        let texts: Vec<String> = app
            .store
            .read(|s| s.active_conversation().iter().map(|m| m.text.clone()).collect());
        assert_eq!(texts, vec![GREETING, "Hi", "echo: Hi"]);
        assert!(!texts.iter().any(|t| t == REPLY_ERROR_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_blank_input_is_kept_and_ignored() {
        let mut app = app();
        app.input = "   ".to_string();

        app.send_message();

        assert_eq!(app.input, "   ");
        assert_eq!(app.store.read(|s| s.active_conversation().len()), 1);
    }

    #[tokio::test]
    async fn test_new_session_archives_and_lists() {
        let mut app = app();
        app.input = "Hi".to_string();
        app.send_message();
        settle(&app).await;

        app.new_session();
        settle(&app).await;
        app.process_events();

        let entries = app.sidebar_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "Echo Chat");
        assert_eq!(app.notice.as_deref(), Some("Archived: Echo Chat"));
    }

    #[tokio::test]
    async fn test_sidebar_navigation_and_delete() {
        let mut app = app();
        app.input = "Hi".to_string();
        app.send_message();
        settle(&app).await;
        app.new_session();
        settle(&app).await;

        app.toggle_sidebar();
        assert_eq!(app.focus, Focus::Sidebar);
        assert_eq!(app.sidebar_selected, 0);

        app.select_next();
        app.activate_selected();
        assert_eq!(app.focus, Focus::Input);
        assert!(!app.store.read(|s| s.active_tab().is_current()));

        // 查看归档时不能发送
        app.input = "ignored".to_string();
        app.send_message();
        assert_eq!(app.input, "ignored");

        app.toggle_sidebar();
        assert_eq!(app.sidebar_selected, 1);
        app.delete_selected();
        assert_eq!(app.sidebar_entries().len(), 1);
        assert_eq!(app.sidebar_selected, 0);
        assert!(app.store.read(|s| s.active_tab().is_current()));

        // "Current Chat" 不可删除
        app.delete_selected();
        assert_eq!(app.sidebar_entries().len(), 1);
    }

    #[test]
    fn test_scroll_bounds() {
        let mut app = app();

        app.scroll_down(5);
        assert_eq!(app.scroll_offset, 0);
        app.scroll_up(10);
        app.scroll_down(3);
        assert_eq!(app.scroll_offset, 7);
    }
}
