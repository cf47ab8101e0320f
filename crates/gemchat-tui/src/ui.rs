use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use gemchat_core::{Message, Sender, TabId};

use crate::app::{App, ConnectionStatus, Focus};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Everything the renderer needs, copied out of the store in one lock
struct View {
    tab: TabId,
    tab_title: String,
    messages: Vec<Message>,
    sidebar_open: bool,
    reply_pending: bool,
    summarizing: bool,
}

impl View {
    fn capture(app: &App) -> Self {
        app.store.read(|store| {
            let tab = store.active_tab().clone();
            let tab_title = match &tab {
                TabId::Current => "Current Chat".to_string(),
                TabId::Session(id) => store
                    .session(id)
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| "Archived".to_string()),
            };
            Self {
                tab,
                tab_title,
                messages: store.displayed().to_vec(),
                sidebar_open: store.is_sidebar_open(),
                reply_pending: store.is_reply_pending(),
                summarizing: store.is_summarizing(),
            }
        })
    }

    fn is_archived(&self) -> bool {
        !self.tab.is_current()
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    let view = View::capture(app);

    let main_area = if view.sidebar_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(20)])
            .split(f.size());
        draw_sidebar(f, app, columns[0]);
        columns[1]
    } else {
        f.size()
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Messages
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(main_area);

    draw_header(f, app, &view, chunks[0]);
    draw_messages(f, app, &view, chunks[1]);
    draw_input(f, app, &view, chunks[2]);
    draw_status_bar(f, app, &view, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, view: &View, area: Rect) {
    let status_color = match app.status {
        ConnectionStatus::Connected | ConnectionStatus::Direct => Color::Green,
        ConnectionStatus::Disconnected => Color::Red,
    };
    let spinner = SPINNER[(app.tick as usize) % SPINNER.len()];

    let header_text = Line::from(vec![
        Span::styled(
            " Gemchat",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        ),
        Span::styled("  |  ", Style::default().fg(Color::Gray)),
        Span::styled(view.tab_title.clone(), Style::default().fg(Color::White)),
        Span::styled("  |  ", Style::default().fg(Color::Gray)),
        Span::styled(app.status.to_string(), Style::default().fg(status_color)),
        if view.summarizing {
            Span::styled(
                format!("  {} Summarizing...", spinner),
                Style::default().fg(Color::Yellow),
            )
        } else {
            Span::raw("")
        },
    ]);

    let header = Paragraph::new(header_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .sidebar_entries()
        .into_iter()
        .map(|entry| {
            let mut lines = vec![Line::from(Span::styled(
                truncate(&entry.title, width),
                Style::default().fg(Color::White),
            ))];
            if let Some(timestamp) = entry.timestamp {
                lines.push(Line::from(Span::styled(
                    timestamp,
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let border_color = if app.focus == Focus::Sidebar {
        Color::Cyan
    } else {
        Color::Blue
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Sessions")
                .border_style(Style::default().fg(border_color)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.sidebar_selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_messages(f: &mut Frame, app: &App, view: &View, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for msg in &view.messages {
        lines.extend(format_message(msg));
    }

    if view.reply_pending && !view.is_archived() {
        let spinner = SPINNER[(app.tick as usize) % SPINNER.len()];
        lines.push(Line::from(Span::styled(
            format!("Bot: {} typing...", spinner),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let inner_width = area.width.saturating_sub(2);
    let visible = area.height.saturating_sub(2);
    let total = wrapped_height(&lines, inner_width);
    let bottom = total.saturating_sub(visible);
    let scroll = bottom.saturating_sub(app.scroll_offset);

    let title = if view.is_archived() {
        "Messages (archived, read-only)"
    } else {
        "Messages"
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    f.render_widget(paragraph, area);
}

fn format_message(msg: &Message) -> Vec<Line<'_>> {
    let (prefix, style) = match msg.sender {
        Sender::User => ("You: ", Style::default().fg(Color::Cyan)),
        Sender::Bot => ("Bot: ", Style::default().fg(Color::Green)),
    };

    let mut lines = Vec::new();
    for (i, text) in msg.text.lines().enumerate() {
        let lead = if i == 0 { prefix } else { "     " };
        lines.push(Line::from(vec![
            Span::styled(lead, style.add_modifier(Modifier::BOLD)),
            Span::styled(text, style),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(prefix, style)));
    }

    // Empty line for separation
    lines.push(Line::from(""));
    lines
}

/// Rows the lines take once wrapped to `width` columns
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| s.content.width()).sum();
            w.div_ceil(width).max(1)
        })
        .sum();
    rows.min(u16::MAX as usize) as u16
}

fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn draw_input(f: &mut Frame, app: &App, view: &View, area: Rect) {
    let input_text = if view.is_archived() {
        Line::from(Span::styled(
            "Viewing an archived session. Ctrl+B to go back to Current Chat",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if view.reply_pending || view.summarizing {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::styled(app.input.as_str(), Style::default().fg(Color::Gray)),
        ])
    } else if app.input.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(
                "Type a message and press Enter to send...",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(app.input.as_str(), Style::default().fg(Color::White)),
            Span::styled("▌", Style::default().fg(Color::Green)),
        ])
    };

    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Input")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(input, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, view: &View, area: Rect) {
    let help_text = match app.focus {
        Focus::Sidebar => "[↑/↓] Select  [Enter] Open  [d/Del] Delete  [Ctrl+B] Close  [Ctrl+C] Quit",
        Focus::Input => "[Enter] Send  [Ctrl+N] New Session  [Ctrl+B] Sessions  [PgUp/PgDn] Scroll  [Ctrl+C] Quit",
    };

    let status = match &app.notice {
        Some(notice) => format!(" {} | {}", notice, help_text),
        None => format!(" Messages: {} | {}", view.messages.len(), help_text),
    };

    let status_bar = Paragraph::new(status)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::REVERSED));

    f.render_widget(status_bar, area);
}
