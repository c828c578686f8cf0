//! Confirmation and prompt capability used by handlers

use crate::chat::PromptResponse;

/// Something that can ask the user a yes/no question or for a line of text.
///
/// The TUI answers through modal dialogs; tests use scripted answers.
pub trait Interaction {
    fn confirm(&mut self, question: &str) -> bool;

    fn prompt(&mut self, label: &str, initial: &str) -> PromptResponse;
}

/// An answer already collected from a dialog.
///
/// Dialogs in the TUI finish before the handler runs; the handler then
/// reads the collected answer through this adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAnswer {
    Confirmed(bool),
    Text(PromptResponse),
}

impl Interaction for DialogAnswer {
    fn confirm(&mut self, _question: &str) -> bool {
        matches!(self, DialogAnswer::Confirmed(true))
    }

    fn prompt(&mut self, _label: &str, _initial: &str) -> PromptResponse {
        match self {
            DialogAnswer::Text(response) => response.clone(),
            DialogAnswer::Confirmed(_) => PromptResponse::Cancelled,
        }
    }
}
