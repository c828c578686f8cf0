use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub label: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    pub const fn new(
        key: KeyCode,
        modifiers: KeyModifiers,
        label: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            modifiers,
            label,
            description,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }
}

/// Global actions reachable from any pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Help,
    NewSession,
    Upload,
    Export,
    CancelRequests,
    FocusNext,
}

/// Application key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(GlobalAction, KeyBinding)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let ctrl = KeyModifiers::CONTROL;
        Self {
            bindings: vec![
                (
                    GlobalAction::Quit,
                    KeyBinding::new(KeyCode::Char('c'), ctrl, "Ctrl+C", "離開"),
                ),
                (
                    GlobalAction::Help,
                    KeyBinding::new(KeyCode::Char('g'), ctrl, "Ctrl+G", "顯示/隱藏說明"),
                ),
                (
                    GlobalAction::NewSession,
                    KeyBinding::new(KeyCode::Char('n'), ctrl, "Ctrl+N", "新增聊天室"),
                ),
                (
                    GlobalAction::Upload,
                    KeyBinding::new(KeyCode::Char('u'), ctrl, "Ctrl+U", "上傳檔案"),
                ),
                (
                    GlobalAction::Export,
                    KeyBinding::new(KeyCode::Char('e'), ctrl, "Ctrl+E", "匯出 Excel"),
                ),
                (
                    GlobalAction::CancelRequests,
                    KeyBinding::new(KeyCode::Char('x'), ctrl, "Ctrl+X", "取消等待中的回覆"),
                ),
                (
                    GlobalAction::FocusNext,
                    KeyBinding::new(KeyCode::Tab, KeyModifiers::NONE, "Tab", "切換焦點"),
                ),
            ],
        }
    }
}

impl KeyMap {
    /// Resolve a key press to a global action
    pub fn action_for(&self, event: &KeyEvent) -> Option<GlobalAction> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.matches(event))
            .map(|(action, _)| *action)
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        let mut lines: Vec<String> = self
            .bindings
            .iter()
            .map(|(_, b)| format!("{:<8} {}", b.label, b.description))
            .collect();
        lines.extend(
            [
                ("↑/↓", "選擇聊天室或訊息"),
                ("Enter", "送出訊息 / 重新命名聊天室"),
                ("e", "編輯選取的訊息"),
                ("d", "刪除選取的訊息"),
            ]
            .iter()
            .map(|(label, description)| format!("{:<8} {}", label, description)),
        );
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_lookup() {
        let keys = KeyMap::default();
        let ctrl_n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert_eq!(keys.action_for(&ctrl_n), Some(GlobalAction::NewSession));

        let plain_n = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(keys.action_for(&plain_n), None);

        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(keys.action_for(&tab), Some(GlobalAction::FocusNext));
    }

    #[test]
    fn test_help_mentions_every_binding() {
        let help = KeyMap::default().help_text();
        for label in ["Ctrl+C", "Ctrl+N", "Ctrl+U", "Ctrl+E", "Ctrl+X", "Tab"] {
            assert!(help.contains(label), "missing {label}");
        }
    }
}
