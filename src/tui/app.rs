use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

use crate::app::{self, AppEvent, ChatApp, DialogAnswer, OutboundRequest, APP_TITLE};
use crate::chat::{Message, MessageId, PromptResponse, Sender};
use crate::tui::{
    dialogs::{centered_rect, Dialog, DialogOutcome, DialogPurpose},
    events::Event,
    keys::{GlobalAction, KeyMap},
    styles::Theme,
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;
const UPLOAD_PROMPT: &str = "上傳檔案路徑：";
const INPUT_PLACEHOLDER: &str = "輸入訊息，Enter 送出";

/// Pane receiving plain key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Messages,
    Input,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Messages,
            Focus::Messages => Focus::Input,
            Focus::Input => Focus::Sidebar,
        }
    }
}

/// View state and key handling around `ChatApp`
pub struct TuiApp {
    chat: ChatApp,
    export_dir: PathBuf,
    event_sender: mpsc::UnboundedSender<Event>,

    focus: Focus,
    input: String,
    selected_message: Option<MessageId>,
    dialog: Option<Dialog>,
    status: Option<String>,
    show_help: bool,
    should_quit: bool,

    key_map: KeyMap,
    theme: Theme,
}

impl TuiApp {
    pub fn new(
        chat: ChatApp,
        export_dir: PathBuf,
        event_sender: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            chat,
            export_dir,
            event_sender,
            focus: Focus::Input,
            input: String::new(),
            selected_message: None,
            dialog: None,
            status: None,
            show_help: false,
            should_quit: false,
            key_map: KeyMap::default(),
            theme: Theme::default(),
        }
    }

    #[cfg(test)]
    pub fn chat(&self) -> &ChatApp {
        &self.chat
    }

    #[cfg(test)]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[cfg(test)]
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Handle one event. Returns true when the UI should exit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::App(app_event) => self.handle_app_event(app_event),
            Event::Resize(width, height) => debug!("Terminal resized to {}x{}", width, height),
            Event::Tick => {}
        }
        self.should_quit
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = self.key_map.action_for(&key);
        if action == Some(GlobalAction::Quit) {
            self.should_quit = true;
            return;
        }

        if let Some(dialog) = self.dialog.as_mut() {
            if let DialogOutcome::Done(answer) = dialog.handle_key(&key) {
                let purpose = dialog.purpose();
                self.dialog = None;
                self.apply_dialog(purpose, answer);
            }
            return;
        }

        if let Some(action) = action {
            self.handle_action(action);
            return;
        }

        if self.show_help {
            if key.code == KeyCode::Esc {
                self.show_help = false;
            }
            return;
        }

        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(key),
            Focus::Messages => self.handle_messages_key(key),
            Focus::Input => self.handle_input_key(key),
        }
    }

    fn handle_action(&mut self, action: GlobalAction) {
        match action {
            GlobalAction::Quit => self.should_quit = true,
            GlobalAction::Help => self.show_help = !self.show_help,
            GlobalAction::NewSession => {
                self.chat.new_session();
                self.selected_message = None;
            }
            GlobalAction::Upload => {
                self.dialog = Some(Dialog::prompt(DialogPurpose::UploadPath, UPLOAD_PROMPT, ""));
            }
            GlobalAction::Export => self.export(),
            GlobalAction::CancelRequests => {
                let cancelled = self.chat.cancel_active_requests();
                self.status = Some(if cancelled == 0 {
                    "沒有等待中的回覆".to_string()
                } else {
                    format!("已取消 {} 個等待中的回覆", cancelled)
                });
            }
            GlobalAction::FocusNext => self.focus = self.focus.next(),
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let ids: Vec<_> = self.chat.sessions().iter().map(|s| s.id).collect();
        let current = self
            .chat
            .sessions()
            .position(self.chat.active_session())
            .unwrap_or(0);

        let target = match key.code {
            KeyCode::Up => current.checked_sub(1),
            KeyCode::Down => Some(current + 1).filter(|i| *i < ids.len()),
            KeyCode::Enter | KeyCode::Char('r') => {
                let id = self.chat.active_session();
                if let Some(name) = self.chat.sessions().name_of(id) {
                    self.dialog = Some(Dialog::prompt(
                        DialogPurpose::RenameSession(id),
                        app::RENAME_PROMPT,
                        name,
                    ));
                }
                None
            }
            _ => None,
        };

        if let Some(id) = target.and_then(|i| ids.get(i).copied()) {
            if self.chat.select_session(id) {
                self.selected_message = None;
            }
        }
    }

    fn handle_messages_key(&mut self, key: KeyEvent) {
        let ids: Vec<MessageId> = self.active_messages().map(|m| m.id).collect();
        let position = self
            .selected_message
            .and_then(|id| ids.iter().position(|m| *m == id));

        match key.code {
            KeyCode::Up => {
                let index = match position {
                    Some(i) => i.saturating_sub(1),
                    None => ids.len().saturating_sub(1),
                };
                self.selected_message = ids.get(index).copied();
            }
            KeyCode::Down => {
                if let Some(i) = position {
                    self.selected_message = ids.get(i + 1).copied().or(Some(ids[i]));
                }
            }
            KeyCode::Esc => self.selected_message = None,
            KeyCode::Char('e') => {
                let dialog = self.selected_user_message().map(|message| {
                    Dialog::prompt(
                        DialogPurpose::EditMessage(message.id),
                        app::EDIT_PROMPT,
                        &message.text,
                    )
                });
                if dialog.is_some() {
                    self.dialog = dialog;
                }
            }
            KeyCode::Char('d') => {
                let dialog = self.selected_user_message().map(|message| {
                    Dialog::confirm(DialogPurpose::DeleteMessage(message.id), app::DELETE_CONFIRM)
                });
                if dialog.is_some() {
                    self.dialog = dialog;
                }
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                if let Some(request) = self.chat.submit_text(&text) {
                    self.status = None;
                    self.dispatch(request);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn selected_user_message(&self) -> Option<&Message> {
        self.selected_message
            .and_then(|id| self.chat.messages().get(id))
            .filter(|m| m.sender == Sender::User)
    }

    fn active_messages(&self) -> impl Iterator<Item = &Message> + Clone {
        self.chat.messages().messages_for(self.chat.active_session())
    }

    fn apply_dialog(&mut self, purpose: DialogPurpose, mut answer: DialogAnswer) {
        match purpose {
            DialogPurpose::RenameSession(id) => {
                self.chat.rename_session(id, &mut answer);
            }
            DialogPurpose::EditMessage(id) => {
                self.chat.edit_message(id, &mut answer);
            }
            DialogPurpose::DeleteMessage(id) => {
                if self.chat.delete_message(id, &mut answer) {
                    self.selected_message = None;
                }
            }
            DialogPurpose::UploadPath => {
                if let DialogAnswer::Text(PromptResponse::Submitted(path)) = answer {
                    let path = path.trim();
                    if !path.is_empty() {
                        self.load_upload(PathBuf::from(path));
                    }
                }
            }
        }
    }

    fn load_upload(&self, path: PathBuf) {
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = app::load_attachment(&path).await;
            let _ = sender.send(Event::App(AppEvent::AttachmentLoaded { path, result }));
        });
    }

    /// Run a request on a background task and report its outcome
    fn dispatch(&mut self, request: OutboundRequest) {
        let agent = self.chat.agent();
        let relay = self.chat.relay();
        let sender = self.event_sender.clone();
        let request_id = request.id;

        let handle = tokio::spawn(async move {
            let outcome = request.execute(agent, relay).await;
            debug!("Request {} finished (success: {})", request.id, outcome.is_success());
            let _ = sender.send(Event::App(AppEvent::RequestCompleted {
                request_id: request.id,
                session_id: request.session_id,
                outcome,
            }));
        });
        self.chat.track(request_id, handle.abort_handle());
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        if let Some(session_id) = event.session_id() {
            debug!("Applying background result for session {}", session_id);
        }
        match event {
            AppEvent::RequestCompleted {
                request_id,
                outcome,
                ..
            } => {
                self.chat.complete(request_id, outcome);
                if let Some(notice) = self.chat.take_notice() {
                    self.status = Some(notice);
                }
            }
            AppEvent::AttachmentLoaded { path, result } => match result {
                Ok(attachment) => {
                    if let Some(request) = self.chat.submit_upload(attachment) {
                        self.dispatch(request);
                    }
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    self.status = Some(format!("無法讀取檔案 {}：{}", path.display(), e));
                }
            },
        }
    }

    fn export(&mut self) {
        match self.chat.export(&self.export_dir) {
            Ok(path) => {
                info!("History exported to {}", path.display());
                self.status = Some(format!("已匯出至 {}", path.display()));
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.status = Some(format!("匯出失敗：{}", e));
            }
        }
    }

    /// Render the application UI
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(columns[1]);

        self.render_sidebar(frame, columns[0]);
        self.render_messages(frame, right[0]);
        self.render_input(frame, right[1]);
        self.render_status_bar(frame, chunks[1]);

        if self.show_help {
            self.render_help_overlay(frame);
        }
        if let Some(dialog) = &self.dialog {
            dialog.render(frame, &self.theme);
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let sessions = self.chat.sessions();
        let items: Vec<ListItem> = sessions
            .iter()
            .map(|session| {
                let pending = self.chat.pending_in(session.id);
                let mut spans = vec![Span::raw(session.name.clone())];
                if pending > 0 {
                    spans.push(Span::styled(format!(" ({})", pending), self.theme.dim_style()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(APP_TITLE)
                    .border_style(self.theme.border_style(self.focus == Focus::Sidebar)),
            )
            .style(self.theme.base_style())
            .highlight_style(self.theme.selection_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(sessions.position(self.chat.active_session()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        let title = self
            .chat
            .sessions()
            .active()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(self.theme.border_style(self.focus == Focus::Messages));

        let wrap_width = area.width.saturating_sub(4).max(1) as usize;
        let messages: Vec<&Message> = self.active_messages().collect();
        let items: Vec<ListItem> = messages
            .iter()
            .map(|message| self.message_item(message, wrap_width))
            .collect();

        let selected = self
            .selected_message
            .and_then(|id| messages.iter().position(|m| m.id == id));

        let mut list = List::new(items).block(block).style(self.theme.base_style());
        if selected.is_some() {
            list = list.highlight_style(self.theme.selection_style());
        }

        // Without a selection, stick to the newest message
        let mut state = ListState::default();
        state.select(selected.or(messages.len().checked_sub(1)));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn message_item(&self, message: &Message, wrap_width: usize) -> ListItem<'static> {
        let mut header = vec![
            Span::styled(message.sender.label(), self.theme.sender_style(message.sender)),
            Span::styled(
                format!("  {}", message.created_at.with_timezone(&Local).format("%H:%M")),
                self.theme.dim_style(),
            ),
        ];
        if let Some(attachment) = &message.attachment {
            header.push(Span::styled(
                format!("  [附件] {} ({} bytes)", attachment.name, attachment.bytes.len()),
                self.theme.dim_style(),
            ));
        }

        let mut lines = vec![Line::from(header)];
        lines.extend(
            textwrap::wrap(&message.text, wrap_width)
                .into_iter()
                .map(|line| Line::from(line.into_owned())),
        );
        lines.push(Line::from(""));
        ListItem::new(lines)
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Input;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(focused));
        let inner = block.inner(area);

        let width = self.input.width() as u16;
        let scroll = width.saturating_sub(inner.width.saturating_sub(1));
        let paragraph = if self.input.is_empty() {
            Paragraph::new(Span::styled(INPUT_PLACEHOLDER, self.theme.placeholder_style()))
        } else {
            Paragraph::new(self.input.as_str())
                .style(self.theme.text_style())
                .scroll((0, scroll))
        };
        frame.render_widget(paragraph.block(block), area);

        if focused && self.dialog.is_none() && !self.show_help {
            frame.set_cursor(inner.x + width - scroll, inner.y);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let pending = self.chat.pending_in(self.chat.active_session());
        let (text, style) = match &self.status {
            Some(status) => (status.clone(), self.theme.notice_style()),
            None => (
                "Ctrl+G 說明 | Ctrl+C 離開".to_string(),
                self.theme.status_bar_style(),
            ),
        };
        let text = if pending > 0 {
            format!("等待回覆中 ({}) | {}", pending, text)
        } else {
            text
        };

        frame.render_widget(Paragraph::new(text).style(style), area);
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_text = self.key_map.help_text();
        let height = help_text.lines().count() as u16 + 2;
        let help_area = centered_rect(60, height, frame.size());

        let help_paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("說明")
                    .border_style(self.theme.border_style(true)),
            )
            .style(self.theme.base_style())
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, help_area);
        frame.render_widget(help_paragraph, help_area);
    }
}
