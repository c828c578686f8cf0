//! Modal prompt and confirmation dialogs

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::DialogAnswer;
use crate::chat::{MessageId, PromptResponse, SessionId};
use crate::tui::{styles::Theme, Frame};

/// What a finished dialog is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPurpose {
    RenameSession(SessionId),
    EditMessage(MessageId),
    DeleteMessage(MessageId),
    UploadPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogKind {
    Prompt {
        label: String,
        input: String,
        /// Cursor position in chars
        cursor: usize,
    },
    Confirm {
        question: String,
    },
}

/// Result of feeding a key to a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Pending,
    Done(DialogAnswer),
}

/// A modal dialog owned by the view until it completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    purpose: DialogPurpose,
    kind: DialogKind,
}

impl Dialog {
    /// Text prompt pre-filled with `initial`
    pub fn prompt(purpose: DialogPurpose, label: &str, initial: &str) -> Self {
        Self {
            purpose,
            kind: DialogKind::Prompt {
                label: label.to_string(),
                input: initial.to_string(),
                cursor: initial.chars().count(),
            },
        }
    }

    /// Yes/no question
    pub fn confirm(purpose: DialogPurpose, question: &str) -> Self {
        Self {
            purpose,
            kind: DialogKind::Confirm {
                question: question.to_string(),
            },
        }
    }

    pub fn purpose(&self) -> DialogPurpose {
        self.purpose
    }

    /// Current text of a prompt dialog
    #[cfg(test)]
    pub fn input(&self) -> Option<&str> {
        match &self.kind {
            DialogKind::Prompt { input, .. } => Some(input),
            DialogKind::Confirm { .. } => None,
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> DialogOutcome {
        match &mut self.kind {
            DialogKind::Confirm { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    DialogOutcome::Done(DialogAnswer::Confirmed(true))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    DialogOutcome::Done(DialogAnswer::Confirmed(false))
                }
                _ => DialogOutcome::Pending,
            },
            DialogKind::Prompt { input, cursor, .. } => match key.code {
                KeyCode::Enter => {
                    DialogOutcome::Done(DialogAnswer::Text(PromptResponse::Submitted(input.clone())))
                }
                KeyCode::Esc => DialogOutcome::Done(DialogAnswer::Text(PromptResponse::Cancelled)),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    input.insert(byte_offset(input, *cursor), c);
                    *cursor += 1;
                    DialogOutcome::Pending
                }
                KeyCode::Backspace if *cursor > 0 => {
                    *cursor -= 1;
                    input.remove(byte_offset(input, *cursor));
                    DialogOutcome::Pending
                }
                KeyCode::Delete if *cursor < input.chars().count() => {
                    input.remove(byte_offset(input, *cursor));
                    DialogOutcome::Pending
                }
                KeyCode::Left => {
                    *cursor = cursor.saturating_sub(1);
                    DialogOutcome::Pending
                }
                KeyCode::Right => {
                    *cursor = (*cursor + 1).min(input.chars().count());
                    DialogOutcome::Pending
                }
                KeyCode::Home => {
                    *cursor = 0;
                    DialogOutcome::Pending
                }
                KeyCode::End => {
                    *cursor = input.chars().count();
                    DialogOutcome::Pending
                }
                _ => DialogOutcome::Pending,
            },
        }
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let area = centered_rect(60, 7, frame.size());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(true))
            .style(theme.base_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.kind {
            DialogKind::Confirm { question } => {
                let body = vec![
                    Line::from(Span::styled(question.as_str(), theme.text_style())),
                    Line::from(""),
                    Line::from(Span::styled("[Y] 確定   [N] 取消", theme.dim_style())),
                ];
                frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), inner);
            }
            DialogKind::Prompt {
                label,
                input,
                cursor,
            } => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(0),
                    ])
                    .split(inner);

                frame.render_widget(
                    Paragraph::new(Span::styled(label.as_str(), theme.text_style())),
                    rows[0],
                );

                // Keep the cursor visible by scrolling long input horizontally
                let before: String = input.chars().take(*cursor).collect();
                let cursor_col = before.width() as u16;
                let scroll = cursor_col.saturating_sub(rows[1].width.saturating_sub(1));
                frame.render_widget(
                    Paragraph::new(input.as_str())
                        .style(theme.text_style())
                        .scroll((0, scroll)),
                    rows[1],
                );
                frame.render_widget(
                    Paragraph::new(Span::styled("Enter 確定   Esc 取消", theme.dim_style())),
                    rows[2],
                );
                frame.set_cursor(rows[1].x + cursor_col - scroll, rows[1].y);
            }
        }
    }
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Rectangle of `percent_x` width and fixed `height`, centered in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(dialog: &mut Dialog, text: &str) {
        for c in text.chars() {
            assert_eq!(dialog.handle_key(&key(KeyCode::Char(c))), DialogOutcome::Pending);
        }
    }

    #[test]
    fn test_prompt_edits_multibyte_text() {
        let mut dialog = Dialog::prompt(DialogPurpose::UploadPath, "路徑", "檔案");
        type_text(&mut dialog, ".csv");
        dialog.handle_key(&key(KeyCode::Home));
        dialog.handle_key(&key(KeyCode::Delete));
        dialog.handle_key(&key(KeyCode::End));
        dialog.handle_key(&key(KeyCode::Backspace));

        assert_eq!(dialog.input(), Some("案.cs"));
        assert_eq!(
            dialog.handle_key(&key(KeyCode::Enter)),
            DialogOutcome::Done(DialogAnswer::Text(PromptResponse::Submitted("案.cs".into())))
        );
    }

    #[test]
    fn test_prompt_escape_cancels() {
        let mut dialog = Dialog::prompt(DialogPurpose::RenameSession(SessionId(1)), "名稱", "Chat 1");
        type_text(&mut dialog, "abc");
        assert_eq!(
            dialog.handle_key(&key(KeyCode::Esc)),
            DialogOutcome::Done(DialogAnswer::Text(PromptResponse::Cancelled))
        );
    }

    #[test]
    fn test_prompt_allows_empty_submission() {
        let mut dialog = Dialog::prompt(DialogPurpose::EditMessage(MessageId(3)), "訊息", "x");
        dialog.handle_key(&key(KeyCode::Backspace));
        assert_eq!(
            dialog.handle_key(&key(KeyCode::Enter)),
            DialogOutcome::Done(DialogAnswer::Text(PromptResponse::Submitted(String::new())))
        );
    }

    #[test]
    fn test_confirm_answers() {
        let mut dialog = Dialog::confirm(DialogPurpose::DeleteMessage(MessageId(1)), "刪除?");
        assert_eq!(dialog.handle_key(&key(KeyCode::Char('q'))), DialogOutcome::Pending);
        assert_eq!(
            dialog.handle_key(&key(KeyCode::Char('y'))),
            DialogOutcome::Done(DialogAnswer::Confirmed(true))
        );
        assert_eq!(
            dialog.handle_key(&key(KeyCode::Esc)),
            DialogOutcome::Done(DialogAnswer::Confirmed(false))
        );
        assert_eq!(dialog.input(), None);
    }

    #[test]
    fn test_centered_rect_fits_small_areas() {
        let area = Rect::new(0, 0, 100, 30);
        let rect = centered_rect(60, 7, area);
        assert_eq!(rect.height, 7);
        assert_eq!(rect.width, 60);
        assert_eq!(rect.y, 11);

        let tiny = centered_rect(60, 7, Rect::new(0, 0, 20, 4));
        assert!(tiny.height <= 4);
    }
}
