//! Chat sessions and the session store

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PromptResponse;

/// Session identifier, assigned from a monotonically increasing counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub name: String,
}

impl ChatSession {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            name: format!("Chat {}", id),
        }
    }
}

/// Ordered collection of sessions plus the active selection
#[derive(Debug)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    active: SessionId,
    next_id: u64,
}

impl SessionStore {
    /// Create a store holding the initial "Chat 1" session
    pub fn new() -> Self {
        let first = ChatSession::new(SessionId(1));
        Self {
            active: first.id,
            sessions: vec![first],
            next_id: 2,
        }
    }

    /// Create a session, append it and make it active
    pub fn create_session(&mut self) -> &ChatSession {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.push(ChatSession::new(id));
        self.active = id;
        &self.sessions[self.sessions.len() - 1]
    }

    /// Rename a session. Cancelled prompts, blank names and unknown ids are
    /// ignored; returns whether the name changed.
    pub fn rename_session(&mut self, id: SessionId, response: PromptResponse) -> bool {
        let PromptResponse::Submitted(name) = response else {
            return false;
        };
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Select a session; unknown ids leave the selection unchanged
    pub fn set_active_session(&mut self, id: SessionId) -> bool {
        if self.contains(id) {
            self.active = id;
            true
        } else {
            false
        }
    }

    pub fn active_id(&self) -> SessionId {
        self.active
    }

    pub fn active(&self) -> Option<&ChatSession> {
        self.get(self.active)
    }

    pub fn get(&self, id: SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.get(id).is_some()
    }

    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    /// Position of a session in display order
    pub fn position(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
