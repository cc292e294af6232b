//! Context Builder: ordered prior turns for a session.

use chrono::{DateTime, Utc};
use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::ChatError;
use uuid::Uuid;

use super::repository::ChatRepository;

/// Reads a session's history, oldest first, optionally bounded to the most
/// recent `limit` messages.
///
/// Each call reads the latest committed snapshot; concurrent completions on
/// the same session may observe each other's turns in either order.
pub struct ContextBuilder<'a, C: ChatRepository> {
    repo: &'a C,
    limit: Option<u32>,
}

impl<'a, C: ChatRepository> ContextBuilder<'a, C> {
    /// Unbounded history.
    pub fn new(repo: &'a C) -> Self {
        Self { repo, limit: None }
    }

    /// Keep only the most recent `limit` messages (`None` = unbounded).
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Fails with `NotFound` if the session does not exist.
    pub async fn build(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        if self.repo.get_session(session_id).await?.is_none() {
            return Err(ChatError::NotFound("session".to_string()));
        }
        Ok(self.repo.get_messages(session_id, self.limit).await?)
    }
}

/// Earliest stamp a new message in `session` may carry: the later of the
/// session start and its newest message.
///
/// Keeps `created_at` non-decreasing in write order even when the wall
/// clock steps backwards between writes.
pub async fn last_write_at<C: ChatRepository>(
    repo: &C,
    session: &ChatSession,
) -> Result<DateTime<Utc>, ChatError> {
    let newest = repo.get_messages(&session.id, Some(1)).await?;
    Ok(newest
        .last()
        .map_or(session.created_at, |m| m.created_at.max(session.created_at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_session, InMemoryStore};
    use parley_types::chat::MessageRole;

    #[tokio::test]
    async fn test_build_returns_messages_in_write_order() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;

        let mut written = Vec::new();
        for i in 0..5 {
            let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
            let msg = ChatMessage::new(session.id, None, role, format!("m{i}"));
            store.save_message(&msg).await.unwrap();
            written.push(msg.id);
        }

        let builder = ContextBuilder::new(&store);
        let first: Vec<Uuid> = builder.build(&session.id).await.unwrap().iter().map(|m| m.id).collect();
        let second: Vec<Uuid> = builder.build(&session.id).await.unwrap().iter().map(|m| m.id).collect();

        // seeded session carries its first message
        assert_eq!(first.len(), 6);
        assert_eq!(&first[1..], written.as_slice());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_build_with_limit_keeps_most_recent() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        for i in 0..12 {
            let msg = ChatMessage::new(session.id, None, MessageRole::User, format!("m{i}"));
            store.save_message(&msg).await.unwrap();
        }

        let history = ContextBuilder::new(&store)
            .with_limit(Some(10))
            .build(&session.id)
            .await
            .unwrap();

        assert_eq!(history.len(), 10);
        assert_eq!(history[0].content, "m2");
        assert_eq!(history[9].content, "m11");
    }

    #[tokio::test]
    async fn test_build_unknown_session_is_not_found() {
        let store = InMemoryStore::new();
        let err = ContextBuilder::new(&store).build(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_last_write_at_follows_newest_message() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        let future = chrono::Utc::now() + chrono::Duration::seconds(30);
        let mut ahead = ChatMessage::new(session.id, None, MessageRole::Assistant, "ahead");
        ahead.created_at = future;
        store.save_message(&ahead).await.unwrap();

        assert_eq!(last_write_at(&store, &session).await.unwrap(), future);
    }

    #[tokio::test]
    async fn test_last_write_at_never_precedes_session_start() {
        let store = InMemoryStore::new();
        let session = seeded_session(&store).await;
        assert!(last_write_at(&store, &session).await.unwrap() >= session.created_at);
    }
}
