//! Chat session and message types for Parley.
//!
//! A session is a named thread of messages belonging to a user. Sessions
//! start open and may be closed exactly once by recording `finished_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Lifecycle state of a chat session, derived from `finished_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// A chat session owned by a user.
///
/// Serialized with the wire names `start_at` / `finish_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "start_at")]
    pub created_at: DateTime<Utc>,
    /// Set once when the session is closed; never rewritten afterwards.
    #[serde(rename = "finish_at")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    /// Create a new open session for a user.
    pub fn new(user_id: Uuid, title: Option<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            description,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.finished_at.is_some() {
            SessionState::Closed
        } else {
            SessionState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }
}

/// A single message within a chat session.
///
/// Messages are ordered by `created_at` (then insertion order) within a
/// session. Serialized with the wire names `timestamp` / `vector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Optional embedding vector. Not used by the completion path.
    #[serde(rename = "vector")]
    pub embedding: Option<Vec<f32>>,
}

impl ChatMessage {
    /// Create a new message stamped with the current time.
    pub fn new(
        session_id: Uuid,
        user_id: Option<Uuid>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            user_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
            embedding: None,
        }
    }

    /// Ensure this message is not stamped earlier than `previous`.
    ///
    /// Keeps `created_at` non-decreasing within a session even if the wall
    /// clock steps backwards between two writes.
    pub fn not_before(mut self, previous: DateTime<Utc>) -> Self {
        if self.created_at < previous {
            self.created_at = previous;
        }
        self
    }
}

/// Both sides of one persisted user/assistant exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionExchange {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

/// Result of a stateless single-turn completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleTurnReply {
    /// The user's message, echoed back.
    pub message: String,
    /// The generated reply, trimmed of surrounding whitespace.
    pub response: String,
}
