//! ChatRepository trait definition.
//!
//! Provides CRUD operations for chat sessions and their messages.
//! Follows the same RPITIT pattern as UserRepository.

use chrono::{DateTime, Utc};
use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Every method is a single logical write or read: multi-row writes
/// (session + first message) commit atomically or not at all.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
pub trait ChatRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Create a session together with its first message in one transaction.
    fn create_session(
        &self,
        session: &ChatSession,
        first_message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List sessions, newest first, optionally restricted to one owner.
    fn list_sessions(
        &self,
        user_id: Option<&Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Rewrite a session's title and description.
    ///
    /// Never touches `finished_at`. Returns `NotFound` if the session is missing.
    fn update_session_details(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Record `finished_at` if and only if it is still unset.
    ///
    /// Returns `Ok(false)` when the session was already finished and
    /// `NotFound` when it does not exist.
    fn finish_session(
        &self,
        session_id: &Uuid,
        finished_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete a chat session and (by cascade) its messages.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Save a new message within a session. Committed when this returns.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a single message by ID.
    fn get_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Rewrite a message's content and role.
    fn update_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a single message.
    fn delete_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List messages across all sessions, newest first.
    fn list_messages(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Get a session's messages, oldest first.
    ///
    /// With `most_recent = Some(n)` only the latest `n` messages are
    /// returned, still in chronological order.
    fn get_messages(
        &self,
        session_id: &Uuid,
        most_recent: Option<u32>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
