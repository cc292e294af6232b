//! In-memory doubles shared by the core unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use parley_types::chat::{ChatMessage, ChatSession, MessageRole};
use parley_types::error::{GatewayError, RepositoryError};
use parley_types::llm::{CompletionRequest, CompletionResponse};
use parley_types::user::User;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::llm::box_gateway::BoxCompletionGateway;
use crate::llm::gateway::CompletionGateway;
use crate::repository::user::UserRepository;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
}

/// Vec-backed store implementing both repository traits.
///
/// Clones share the same tables. Messages keep insertion order, which
/// stands in for the `created_at, rowid` ordering of the SQL store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn message_total(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let skip = offset.unwrap_or(0).max(0) as usize;
    let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
    items.skip(skip).take(take).collect()
}

impl ChatRepository for InMemoryStore {
    async fn create_session(
        &self,
        session: &ChatSession,
        first_message: &ChatMessage,
    ) -> Result<ChatSession, RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        t.sessions.push(session.clone());
        t.messages.push(first_message.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        Ok(t.sessions.iter().find(|s| s.id == *session_id).cloned())
    }

    async fn list_sessions(
        &self,
        user_id: Option<&Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        let rows = t
            .sessions
            .iter()
            .rev()
            .filter(|s| user_id.is_none_or(|u| s.user_id == *u))
            .cloned();
        Ok(page(rows, limit, offset))
    }

    async fn update_session_details(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        let stored = t
            .sessions
            .iter_mut()
            .find(|s| s.id == session.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.title = session.title.clone();
        stored.description = session.description.clone();
        Ok(())
    }

    async fn finish_session(
        &self,
        session_id: &Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        let stored = t
            .sessions
            .iter_mut()
            .find(|s| s.id == *session_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.finished_at.is_some() {
            return Ok(false);
        }
        stored.finished_at = Some(finished_at);
        Ok(true)
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.sessions.len();
        t.sessions.retain(|s| s.id != *session_id);
        if t.sessions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        t.messages.retain(|m| m.session_id != *session_id);
        Ok(())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        if !t.sessions.iter().any(|s| s.id == message.session_id) {
            return Err(RepositoryError::Query("FOREIGN KEY constraint failed".into()));
        }
        t.messages.push(message.clone());
        Ok(())
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages.iter().find(|m| m.id == *message_id).cloned())
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        let stored = t
            .messages
            .iter_mut()
            .find(|m| m.id == message.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.content = message.content.clone();
        stored.role = message.role;
        Ok(())
    }

    async fn delete_message(&self, message_id: &Uuid) -> Result<(), RepositoryError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.messages.len();
        t.messages.retain(|m| m.id != *message_id);
        if t.messages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        Ok(page(t.messages.iter().rev().cloned(), limit, offset))
    }

    async fn get_messages(
        &self,
        session_id: &Uuid,
        most_recent: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        let all: Vec<ChatMessage> = t
            .messages
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect();
        let start = match most_recent {
            Some(n) => all.len().saturating_sub(n as usize),
            None => 0,
        };
        Ok(all[start..].to_vec())
    }
}

impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        self.tables.lock().unwrap().users.push(user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == *id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.tables.lock().unwrap().users.clone())
    }
}

/// Create a user plus an open session carrying one user message.
pub async fn seeded_session(store: &InMemoryStore) -> ChatSession {
    let user = store.create_user(&User::new("tester")).await.unwrap();
    let session = ChatSession::new(user.id, Some("seed".into()), Some("seed session".into()));
    let first = ChatMessage::new(session.id, Some(user.id), MessageRole::User, "seed");
    store.create_session(&session, &first).await.unwrap()
}

type Reply = Result<String, String>;

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<CompletionRequest>,
}

/// Gateway double that plays back scripted replies in order and records
/// every request it receives. Clones share the script.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    /// Reply with each string in turn.
    pub fn replying<const N: usize>(replies: [&str; N]) -> Self {
        Self::scripted(replies.map(|r| Ok(r.to_string())))
    }

    /// Fail every call with an upstream error.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Mix of replies (`Ok`) and upstream failures (`Err`).
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Self {
        let gateway = Self::default();
        gateway.script.lock().unwrap().replies.extend(replies);
        gateway
    }

    pub fn boxed(self) -> BoxCompletionGateway {
        BoxCompletionGateway::new(self)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl CompletionGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        match script.replies.pop_front() {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                model: Some("scripted-model".to_string()),
                finish_reason: Some("stop".to_string()),
            }),
            Some(Err(msg)) => Err(GatewayError::Upstream(msg)),
            None => Err(GatewayError::Upstream("no scripted reply".to_string())),
        }
    }
}
