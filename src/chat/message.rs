//! Messages and the message store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PromptResponse, SessionId, SessionStore, StoreError};

/// Stable message identifier; never reused after deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Localized label shown in the UI and in exports
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "使用者",
            Sender::Bot => "機器人",
        }
    }
}

/// A file attached to a message. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One turn in a session
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender: Sender,
    pub text: String,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

/// Ordered message history for all sessions
#[derive(Debug)]
pub struct MessageStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a message to an existing session and return its id
    pub fn append(
        &mut self,
        sessions: &SessionStore,
        session_id: SessionId,
        sender: Sender,
        text: impl Into<String>,
        attachment: Option<Attachment>,
    ) -> Result<MessageId, StoreError> {
        if !sessions.contains(session_id) {
            return Err(StoreError::UnknownSession(session_id));
        }

        let id = MessageId(self.next_id);
        self.next_id += 1;

        self.messages.push(Message {
            id,
            session_id,
            sender,
            text: text.into(),
            attachment,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    /// Replace the text of a message; returns whether it changed
    pub fn edit(&mut self, id: MessageId, response: PromptResponse) -> bool {
        let PromptResponse::Submitted(text) = response else {
            return false;
        };

        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.text = text;
                true
            }
            None => false,
        }
    }

    /// Remove a message, keeping the order of the rest
    pub fn delete(&mut self, id: MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    /// Messages of one session in insertion order
    pub fn messages_for(&self, session_id: SessionId) -> impl Iterator<Item = &Message> + Clone {
        self.messages.iter().filter(move |m| m.session_id == session_id)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SessionStore, MessageStore) {
        let mut sessions = SessionStore::new();
        sessions.create_session();
        (sessions, MessageStore::new())
    }

    fn texts(store: &MessageStore, session: SessionId) -> Vec<String> {
        store.messages_for(session).map(|m| m.text.clone()).collect()
    }

    #[test]
    fn test_append_lands_last_in_session_view() {
        let (sessions, mut store) = setup();
        store.append(&sessions, SessionId(1), Sender::User, "a", None).unwrap();
        store.append(&sessions, SessionId(2), Sender::User, "b", None).unwrap();
        let id = store.append(&sessions, SessionId(1), Sender::Bot, "c", None).unwrap();

        let last = store.messages_for(SessionId(1)).last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(texts(&store, SessionId(1)), vec!["a", "c"]);
        assert_eq!(texts(&store, SessionId(2)), vec!["b"]);
    }

    #[test]
    fn test_append_rejects_unknown_session() {
        let (sessions, mut store) = setup();
        let err = store
            .append(&sessions, SessionId(7), Sender::User, "x", None)
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownSession(SessionId(7)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_preserves_order_and_ids() {
        let (sessions, mut store) = setup();
        let ids: Vec<_> = ["1", "2", "3", "4"]
            .iter()
            .map(|t| store.append(&sessions, SessionId(1), Sender::User, *t, None).unwrap())
            .collect();

        let removed = store.delete(ids[1]).unwrap();
        assert_eq!(removed.text, "2");
        assert_eq!(texts(&store, SessionId(1)), vec!["1", "3", "4"]);
        assert!(store.messages_for(SessionId(1)).all(|m| m.id != ids[1]));

        // Ids held before the delete still address the same messages.
        assert!(store.edit(ids[3], PromptResponse::Submitted("four".into())));
        assert_eq!(texts(&store, SessionId(1)), vec!["1", "3", "four"]);
        assert!(store.delete(ids[1]).is_none());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (sessions, mut store) = setup();
        let first = store.append(&sessions, SessionId(1), Sender::User, "x", None).unwrap();
        store.delete(first);
        let second = store.append(&sessions, SessionId(1), Sender::User, "y", None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_edit_cancel_and_unknown_are_noops() {
        let (sessions, mut store) = setup();
        let id = store.append(&sessions, SessionId(1), Sender::User, "orig", None).unwrap();
        assert!(!store.edit(id, PromptResponse::Cancelled));
        assert!(!store.edit(MessageId(999), PromptResponse::Submitted("x".into())));
        assert_eq!(store.get(id).unwrap().text, "orig");

        assert!(store.edit(id, PromptResponse::Submitted(String::new())));
        assert_eq!(store.get(id).unwrap().text, "");
    }

    #[test]
    fn test_messages_for_is_restartable() {
        let (sessions, mut store) = setup();
        store.append(&sessions, SessionId(1), Sender::User, "a", None).unwrap();
        store.append(&sessions, SessionId(1), Sender::Bot, "b", None).unwrap();

        let view = store.messages_for(SessionId(1));
        assert_eq!(view.clone().count(), 2);
        assert_eq!(view.map(|m| m.sender).collect::<Vec<_>>(), vec![Sender::User, Sender::Bot]);
    }

    #[test]
    fn test_attachment_debug_hides_bytes() {
        let attachment = Attachment {
            name: "spec.pdf".into(),
            bytes: vec![0; 2048],
        };
        let rendered = format!("{:?}", attachment);
        assert!(rendered.contains("spec.pdf"));
        assert!(rendered.contains("2048"));
    }
}
