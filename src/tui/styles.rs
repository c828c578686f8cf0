use ratatui::style::{Color, Modifier, Style};

use crate::chat::Sender;

/// Application theme configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,

    pub text: Color,
    pub text_dim: Color,

    pub background: Color,
    pub background_alt: Color,

    pub border: Color,
    pub border_focused: Color,

    pub warning: Color,

    pub placeholder: Color,
    pub selection: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color::Rgb(59, 130, 246), // Blue-500
            secondary: Color::Rgb(148, 163, 184), // Slate-400

            text: Color::Rgb(248, 250, 252), // Slate-50
            text_dim: Color::Rgb(148, 163, 184), // Slate-400

            background: Color::Rgb(15, 23, 42), // Slate-900
            background_alt: Color::Rgb(30, 41, 59), // Slate-800

            border: Color::Rgb(71, 85, 105), // Slate-600
            border_focused: Color::Rgb(59, 130, 246),

            warning: Color::Rgb(245, 158, 11), // Amber-500

            placeholder: Color::Rgb(100, 116, 139), // Slate-500
            selection: Color::Rgb(30, 58, 138), // Blue-900
        }
    }

    /// Base style for normal elements
    pub fn base_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    /// Style for text content
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Border style depending on focus
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.border_focused)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.border)
        }
    }

    /// Style for selected items
    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .add_modifier(Modifier::BOLD)
    }

    /// Heading style for a message author
    pub fn sender_style(&self, sender: Sender) -> Style {
        let color = match sender {
            Sender::User => self.primary,
            Sender::Bot => self.secondary,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    /// Style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.background_alt)
    }

    /// Status bar style when showing a warning
    pub fn notice_style(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .bg(self.background_alt)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for placeholder text
    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::ITALIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_separates_senders_and_focus() {
        let theme = Theme::default();
        assert_eq!(theme.sender_style(Sender::User).fg, Some(Color::Rgb(59, 130, 246)));
        assert_eq!(theme.sender_style(Sender::Bot).fg, Some(Color::Rgb(148, 163, 184)));
        assert_ne!(theme.border_style(true), theme.border_style(false));
        assert_eq!(theme.notice_style().fg, Some(theme.warning));
    }
}
