//! Core application logic and orchestration
//!
//! `ChatApp` owns the session and message stores and implements every user
//! intent as a handler. Handlers mutate the stores synchronously; calls to
//! the agent and the relay are described as `OutboundRequest`s that the
//! caller executes (inline or on a background task) and hands back through
//! `complete`.

mod events;
mod interaction;
mod request;

pub use events::*;
pub use interaction::*;
pub use request::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::{
    agent::AgentClient,
    chat::{Attachment, ChatSession, MessageId, MessageStore, Sender, SessionId, SessionStore},
    export::{self, ExportError},
    relay::ContentRelay,
};

pub const APP_TITLE: &str = "智慧製造Chatbot";
pub const RENAME_PROMPT: &str = "編輯聊天室名稱：";
pub const EDIT_PROMPT: &str = "編輯訊息：";
pub const DELETE_CONFIRM: &str = "確定要刪除這則訊息嗎？";
pub const RELAY_FAILURE_TEXT: &str = "檔案內容讀取失敗，請稍後再試。";
pub const AGENT_FAILURE_NOTICE: &str = "機器人暫時無法回覆，請稍後再試。";

/// Text of the user message recorded for an upload
pub fn upload_message_text(file_name: &str) -> String {
    format!("上傳檔案：{}", file_name)
}

/// Text of the bot message carrying extracted content
pub fn file_content_text(content: &str) -> String {
    format!("檔案內容：\n{}", content)
}

struct InFlight {
    session_id: SessionId,
    abort: Option<AbortHandle>,
}

/// Main application state
pub struct ChatApp {
    sessions: SessionStore,
    messages: MessageStore,
    agent: Arc<dyn AgentClient>,
    relay: Arc<dyn ContentRelay>,
    in_flight: HashMap<RequestId, InFlight>,
    next_request: u64,
    notice: Option<String>,
}

impl ChatApp {
    /// Create a new application instance with the initial session
    pub fn new(agent: Arc<dyn AgentClient>, relay: Arc<dyn ContentRelay>) -> Self {
        Self {
            sessions: SessionStore::new(),
            messages: MessageStore::new(),
            agent,
            relay,
            in_flight: HashMap::new(),
            next_request: 1,
            notice: None,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn agent(&self) -> Arc<dyn AgentClient> {
        Arc::clone(&self.agent)
    }

    pub fn relay(&self) -> Arc<dyn ContentRelay> {
        Arc::clone(&self.relay)
    }

    pub fn active_session(&self) -> SessionId {
        self.sessions.active_id()
    }

    /// Start a new chat and switch to it
    pub fn new_session(&mut self) -> &ChatSession {
        let session = self.sessions.create_session();
        info!("Session created: {}", session.id);
        session
    }

    pub fn select_session(&mut self, id: SessionId) -> bool {
        let selected = self.sessions.set_active_session(id);
        if !selected {
            debug!("Ignoring selection of unknown session {}", id);
        }
        selected
    }

    /// Prompt for a new session name and apply it
    pub fn rename_session(&mut self, id: SessionId, ui: &mut dyn Interaction) -> bool {
        let Some(current) = self.sessions.name_of(id).map(str::to_string) else {
            return false;
        };
        let response = ui.prompt(RENAME_PROMPT, &current);
        self.sessions.rename_session(id, response)
    }

    /// Prompt for new message text and apply it
    pub fn edit_message(&mut self, id: MessageId, ui: &mut dyn Interaction) -> bool {
        let Some(current) = self.messages.get(id).map(|m| m.text.clone()) else {
            return false;
        };
        let response = ui.prompt(EDIT_PROMPT, &current);
        self.messages.edit(id, response)
    }

    /// Delete a message after the user confirms
    pub fn delete_message(&mut self, id: MessageId, ui: &mut dyn Interaction) -> bool {
        if self.messages.get(id).is_none() {
            return false;
        }
        if !ui.confirm(DELETE_CONFIRM) {
            return false;
        }
        self.messages.delete(id).is_some()
    }

    /// Record user text in the active session and describe the agent call.
    /// Blank input is ignored.
    pub fn submit_text(&mut self, input: &str) -> Option<OutboundRequest> {
        if input.trim().is_empty() {
            return None;
        }

        let session_id = self.sessions.active_id();
        self.append(session_id, Sender::User, input.to_string(), None)?;

        Some(self.register(
            session_id,
            RequestKind::Agent {
                input_text: input.to_string(),
            },
        ))
    }

    /// Record an uploaded file in the active session and describe the relay call
    pub fn submit_upload(&mut self, attachment: Attachment) -> Option<OutboundRequest> {
        let session_id = self.sessions.active_id();
        let file_name = attachment.name.clone();
        self.append(
            session_id,
            Sender::User,
            upload_message_text(&file_name),
            Some(attachment),
        )?;

        Some(self.register(session_id, RequestKind::FileContent { file_name }))
    }

    fn register(&mut self, session_id: SessionId, kind: RequestKind) -> OutboundRequest {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.in_flight.insert(
            id,
            InFlight {
                session_id,
                abort: None,
            },
        );
        OutboundRequest {
            id,
            session_id,
            kind,
        }
    }

    /// Attach the abort handle of the task running a request
    pub fn track(&mut self, id: RequestId, abort: AbortHandle) {
        match self.in_flight.get_mut(&id) {
            Some(entry) => entry.abort = Some(abort),
            None => abort.abort(),
        }
    }

    /// Number of requests still waiting for a reply in a session
    pub fn pending_in(&self, session_id: SessionId) -> usize {
        self.in_flight
            .values()
            .filter(|f| f.session_id == session_id)
            .count()
    }

    /// Abort every in-flight request of the active session
    pub fn cancel_active_requests(&mut self) -> usize {
        let session_id = self.sessions.active_id();
        let ids: Vec<RequestId> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.session_id == session_id)
            .map(|(id, _)| *id)
            .collect();

        for id in &ids {
            if let Some(entry) = self.in_flight.remove(id) {
                if let Some(abort) = entry.abort {
                    abort.abort();
                }
                info!("Cancelled request {} in session {}", id, session_id);
            }
        }
        ids.len()
    }

    /// Apply the outcome of a finished request and return the id of the bot
    /// message it produced. Outcomes of cancelled or unknown requests are
    /// dropped.
    pub fn complete(
        &mut self,
        request_id: RequestId,
        outcome: RequestOutcome,
    ) -> Option<MessageId> {
        let Some(entry) = self.in_flight.remove(&request_id) else {
            debug!("Discarding outcome of request {} (no longer tracked)", request_id);
            return None;
        };
        let session_id = entry.session_id;

        match outcome {
            RequestOutcome::AgentReply(Ok(text)) => self.append(session_id, Sender::Bot, text, None),
            RequestOutcome::AgentReply(Err(e)) => {
                warn!("Agent call failed in session {}: {}", session_id, e);
                self.notice = Some(AGENT_FAILURE_NOTICE.to_string());
                None
            }
            RequestOutcome::FileContent(Ok(content)) => {
                self.append(session_id, Sender::Bot, file_content_text(&content), None)
            }
            RequestOutcome::FileContent(Err(e)) => {
                warn!("File content relay failed in session {}: {}", session_id, e);
                self.append(session_id, Sender::Bot, RELAY_FAILURE_TEXT.to_string(), None)
            }
        }
    }

    /// Execute a request inline and apply its outcome
    pub async fn run_request(&mut self, request: OutboundRequest) -> Option<MessageId> {
        let outcome = request.execute(self.agent(), self.relay()).await;
        self.complete(request.id, outcome)
    }

    /// Send text and wait for the reply to it
    pub async fn send(&mut self, input: &str) -> Option<MessageId> {
        let request = self.submit_text(input)?;
        self.run_request(request).await
    }

    /// Write the full history to a spreadsheet in `dir`
    pub fn export(&mut self, dir: &Path) -> Result<PathBuf, ExportError> {
        export::export_history(&self.sessions, &self.messages, dir)
    }

    /// Latest user-visible notice, cleared on read
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn append(
        &mut self,
        session_id: SessionId,
        sender: Sender,
        text: String,
        attachment: Option<Attachment>,
    ) -> Option<MessageId> {
        match self
            .messages
            .append(&self.sessions, session_id, sender, text, attachment)
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Dropping message: {}", e);
                None
            }
        }
    }
}

/// Read a file from disk into an attachment
pub async fn load_attachment(path: &Path) -> std::io::Result<Attachment> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment { name, bytes })
}
