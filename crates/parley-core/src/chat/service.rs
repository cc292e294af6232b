//! Chat service: users, sessions, and messages.
//!
//! ChatService coordinates the ChatRepository and UserRepository for every
//! operation that does not call the completion service: CRUD, history reads,
//! and the one-way open -> closed session transition.

use chrono::Utc;
use parley_types::chat::{ChatMessage, ChatSession, MessageRole};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::user::User;
use tracing::{info, warn};
use uuid::Uuid;

use super::context::{ContextBuilder, last_write_at};
use super::repository::ChatRepository;
use crate::repository::user::UserRepository;

/// Input for creating a message directly (outside the completion pipeline).
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub role: MessageRole,
    pub embedding: Option<Vec<f32>>,
}

/// Partial rewrite of a message. Absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub role: Option<MessageRole>,
}

/// Partial rewrite of a session. Absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// CRUD over users, sessions, and messages.
///
/// Generic over the repository traits (parley-core never depends on
/// parley-infra).
pub struct ChatService<C: ChatRepository, U: UserRepository> {
    chat_repo: C,
    user_repo: U,
}

impl<C: ChatRepository, U: UserRepository> ChatService<C, U> {
    pub fn new(chat_repo: C, user_repo: U) -> Self {
        Self {
            chat_repo,
            user_repo,
        }
    }

    // --- Users ---

    pub async fn create_user(&self, name: &str) -> Result<User, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Validation("name is required".to_string()));
        }
        let user = self.user_repo.create_user(&User::new(name)).await?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &Uuid) -> Result<User, ChatError> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("user".to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ChatError> {
        Ok(self.user_repo.list_users().await?)
    }

    // --- Sessions ---

    pub async fn get_session(&self, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        self.chat_repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("session".to_string()))
    }

    /// List sessions newest first, optionally for one user.
    pub async fn list_sessions(
        &self,
        user_id: Option<&Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.chat_repo.list_sessions(user_id, limit, offset).await?)
    }

    /// Rewrite title and/or description. `finished_at` is never touched here.
    pub async fn update_session(
        &self,
        session_id: &Uuid,
        patch: SessionPatch,
    ) -> Result<ChatSession, ChatError> {
        let mut session = self.get_session(session_id).await?;
        if let Some(title) = patch.title {
            session.title = Some(title);
        }
        if let Some(description) = patch.description {
            session.description = Some(description);
        }
        self.chat_repo
            .update_session_details(&session)
            .await
            .map_err(|e| not_found_as(e, "session"))?;
        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &Uuid) -> Result<(), ChatError> {
        self.chat_repo
            .delete_session(session_id)
            .await
            .map_err(|e| not_found_as(e, "session"))?;
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Close a session by recording `finished_at`.
    ///
    /// Fails with `InvalidState` if the session is already closed; the
    /// stored `finished_at` is left unchanged in that case.
    pub async fn finish_session(&self, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        let mut session = self.get_session(session_id).await?;
        if !session.is_open() {
            return Err(ChatError::InvalidState("session is already finished".to_string()));
        }

        let finished_at = Utc::now().max(session.created_at);
        let updated = self
            .chat_repo
            .finish_session(session_id, finished_at)
            .await
            .map_err(|e| not_found_as(e, "session"))?;

        if !updated {
            // Lost a race with a concurrent finish.
            warn!(session_id = %session_id, "Session finished concurrently");
            return Err(ChatError::InvalidState("session is already finished".to_string()));
        }

        session.finished_at = Some(finished_at);
        info!(session_id = %session_id, "Session finished");
        Ok(session)
    }

    /// Full session history, oldest first.
    pub async fn session_history(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        ContextBuilder::new(&self.chat_repo).build(session_id).await
    }

    // --- Messages ---

    /// Create a message in an open session.
    pub async fn create_message(&self, input: NewMessage) -> Result<ChatMessage, ChatError> {
        if input.content.trim().is_empty() {
            return Err(ChatError::Validation("content is required".to_string()));
        }

        let session = self.get_session(&input.session_id).await?;
        if !session.is_open() {
            return Err(ChatError::InvalidState(
                "cannot add messages to a finished session".to_string(),
            ));
        }
        if let Some(user_id) = &input.user_id {
            self.get_user(user_id).await?;
        }

        let floor = last_write_at(&self.chat_repo, &session).await?;
        let mut message = ChatMessage::new(input.session_id, input.user_id, input.role, input.content)
            .not_before(floor);
        message.embedding = input.embedding;

        self.chat_repo.save_message(&message).await?;
        Ok(message)
    }

    pub async fn get_message(&self, message_id: &Uuid) -> Result<ChatMessage, ChatError> {
        self.chat_repo
            .get_message(message_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("message".to_string()))
    }

    /// List messages across all sessions, newest first.
    pub async fn list_messages(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.chat_repo.list_messages(limit, offset).await?)
    }

    /// Rewrite a message's content and/or role.
    pub async fn update_message(
        &self,
        message_id: &Uuid,
        patch: MessagePatch,
    ) -> Result<ChatMessage, ChatError> {
        let mut message = self.get_message(message_id).await?;
        if let Some(content) = patch.content {
            if content.trim().is_empty() {
                return Err(ChatError::Validation("content must not be empty".to_string()));
            }
            message.content = content;
        }
        if let Some(role) = patch.role {
            message.role = role;
        }
        self.chat_repo
            .update_message(&message)
            .await
            .map_err(|e| not_found_as(e, "message"))?;
        Ok(message)
    }

    pub async fn delete_message(&self, message_id: &Uuid) -> Result<(), ChatError> {
        self.chat_repo
            .delete_message(message_id)
            .await
            .map_err(|e| not_found_as(e, "message"))
    }
}

/// Name the missing entity in a repository `NotFound`.
fn not_found_as(e: RepositoryError, entity: &str) -> ChatError {
    match e {
        RepositoryError::NotFound => ChatError::NotFound(entity.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_session, InMemoryStore};

    fn service(store: &InMemoryStore) -> ChatService<InMemoryStore, InMemoryStore> {
        ChatService::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_finish_twice_is_invalid_state() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let svc = service(&store);

        let finished = svc.finish_session(&session.id).await.unwrap();
        let first_finish = finished.finished_at.unwrap();

        let err = svc.finish_session(&session.id).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidState(_)));

        let stored = svc.get_session(&session.id).await.unwrap();
        assert_eq!(stored.finished_at, Some(first_finish));
    }

    #[tokio::test]
    async fn test_finish_unknown_session_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store).finish_session(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(ref e) if e == "session"));
    }

    #[tokio::test]
    async fn test_update_session_keeps_unset_fields() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let svc = service(&store);

        let updated = svc
            .update_session(
                &session.id,
                SessionPatch {
                    title: Some("Renamed".into()),
                    description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("Renamed"));
        assert_eq!(updated.description, session.description);
        assert!(updated.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_create_message_rejects_blank_content() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;

        let err = service(&store)
            .create_message(NewMessage {
                session_id: session.id,
                user_id: None,
                content: "   ".into(),
                role: MessageRole::User,
                embedding: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Validation(_)));
        assert_eq!(store.message_total(), 1);
    }

    #[tokio::test]
    async fn test_create_message_in_finished_session_is_invalid_state() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let svc = service(&store);
        svc.finish_session(&session.id).await.unwrap();

        let err = svc
            .create_message(NewMessage {
                session_id: session.id,
                user_id: None,
                content: "late".into(),
                role: MessageRole::User,
                embedding: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_create_message_stamped_after_latest_message() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let future = Utc::now() + chrono::Duration::seconds(30);
        let mut ahead = ChatMessage::new(session.id, None, MessageRole::Assistant, "ahead");
        ahead.created_at = future;
        store.save_message(&ahead).await.unwrap();

        let msg = service(&store)
            .create_message(NewMessage {
                session_id: session.id,
                user_id: None,
                content: "next".into(),
                role: MessageRole::User,
                embedding: None,
            })
            .await
            .unwrap();

        assert!(msg.created_at >= future);
    }

    #[tokio::test]
    async fn test_create_message_keeps_embedding() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;

        let msg = service(&store)
            .create_message(NewMessage {
                session_id: session.id,
                user_id: Some(session.user_id),
                content: "with vector".into(),
                role: MessageRole::System,
                embedding: Some(vec![0.5, 0.25]),
            })
            .await
            .unwrap();

        let stored = store.get_message(&msg.id).await.unwrap().unwrap();
        assert_eq!(stored.embedding, Some(vec![0.5, 0.25]));
        assert_eq!(stored.role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_update_message_rewrites_content_and_role() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let svc = service(&store);
        let history = svc.session_history(&session.id).await.unwrap();

        let updated = svc
            .update_message(
                &history[0].id,
                MessagePatch {
                    content: Some("edited".into()),
                    role: Some(MessageRole::Assistant),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "edited");
        assert_eq!(updated.role, MessageRole::Assistant);
        assert_eq!(updated.session_id, session.id);
    }

    #[tokio::test]
    async fn test_delete_missing_message_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store).delete_message(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(ref e) if e == "message"));
    }

    #[tokio::test]
    async fn test_delete_session_cascades() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let svc = service(&store);

        svc.delete_session(&session.id).await.unwrap();

        assert!(matches!(
            svc.get_session(&session.id).await.unwrap_err(),
            ChatError::NotFound(_)
        ));
        assert!(svc.list_messages(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_requires_name() {
        let store = InMemoryStore::new();
        let err = service(&store).create_user("  ").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }
}
