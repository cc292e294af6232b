//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split read/write pools:
//! raw queries, private Row structs, reads on the reader pool, writes on the writer.

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::chat::repository::ChatRepository;
use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use parley_types::llm::MessageRole;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    user_id: String,
    title: Option<String>,
    description: Option<String>,
    started_at: String,
    finished_at: Option<String>,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            title: self.title,
            description: self.description,
            created_at: parse_datetime(&self.started_at)?,
            finished_at: self.finished_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    user_id: Option<String>,
    role: String,
    content: String,
    created_at: String,
    embedding: Option<String>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            embedding: row.try_get("embedding")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let embedding = self
            .embedding
            .as_deref()
            .map(serde_json::from_str::<Vec<f32>>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid embedding: {e}")))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            user_id: self
                .user_id
                .as_deref()
                .map(|u| parse_uuid(u, "user_id"))
                .transpose()?,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
            embedding,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so text order matches time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_embedding(embedding: Option<&Vec<f32>>) -> Result<Option<String>, RepositoryError> {
    embedding
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| RepositoryError::Query(format!("invalid embedding: {e}")))
}

fn rows_to_sessions(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatSession>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ChatSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_session()
        })
        .collect()
}

fn rows_to_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<ChatMessage>, RepositoryError> {
    rows.iter()
        .map(|row| {
            ChatMessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_message()
        })
        .collect()
}

fn push_paging(sql: &mut String, limit: Option<i64>, offset: Option<i64>) {
    match (limit, offset) {
        (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
        // SQLite requires LIMIT before OFFSET; -1 means unbounded.
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        (None, None) => {}
    }
}

const INSERT_MESSAGE: &str = r#"INSERT INTO chat_messages (id, session_id, user_id, role, content, created_at, embedding)
   VALUES (?, ?, ?, ?, ?, ?, ?)"#;

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(
        &self,
        session: &ChatSession,
        first_message: &ChatMessage,
    ) -> Result<ChatSession, RepositoryError> {
        let embedding = encode_embedding(first_message.embedding.as_ref())?;

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, title, description, started_at, finished_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.title)
        .bind(&session.description)
        .bind(format_datetime(&session.created_at))
        .bind(session.finished_at.as_ref().map(format_datetime))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(INSERT_MESSAGE)
            .bind(first_message.id.to_string())
            .bind(first_message.session_id.to_string())
            .bind(first_message.user_id.map(|u| u.to_string()))
            .bind(first_message.role.to_string())
            .bind(&first_message.content)
            .bind(format_datetime(&first_message.created_at))
            .bind(embedding)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(
        &self,
        user_id: Option<&Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM chat_sessions");
        if user_id.is_some() {
            sql.push_str(" WHERE user_id = ?");
        }
        sql.push_str(" ORDER BY started_at DESC, rowid DESC");
        push_paging(&mut sql, limit, offset);

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_sessions(&rows)
    }

    async fn update_session_details(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET title = ?, description = ? WHERE id = ?")
            .bind(&session.title)
            .bind(&session.description)
            .bind(session.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn finish_session(
        &self,
        session_id: &Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET finished_at = ? WHERE id = ? AND finished_at IS NULL",
        )
        .bind(format_datetime(&finished_at))
        .bind(session_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Distinguish "already finished" from "missing".
        let exists = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match exists {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(INSERT_MESSAGE)
            .bind(message.id.to_string())
            .bind(message.session_id.to_string())
            .bind(message.user_id.map(|u| u.to_string()))
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(format_datetime(&message.created_at))
            .bind(encode_embedding(message.embedding.as_ref())?)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = ?")
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row = ChatMessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_messages SET content = ?, role = ? WHERE id = ?")
            .bind(&message.content)
            .bind(message.role.to_string())
            .bind(message.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_message(&self, message_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE id = ?")
            .bind(message_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_messages(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM chat_messages ORDER BY created_at DESC, rowid DESC");
        push_paging(&mut sql, limit, offset);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }

    async fn get_messages(
        &self,
        session_id: &Uuid,
        most_recent: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = match most_recent {
            None => sqlx::query(
                "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
            )
            .bind(session_id.to_string())
            .fetch_all(&self.pool.reader)
            .await,
            // Newest n, flipped back to chronological order.
            Some(n) => sqlx::query(
                r#"SELECT * FROM (
                       SELECT *, rowid AS seq FROM chat_messages WHERE session_id = ?
                       ORDER BY created_at DESC, rowid DESC LIMIT ?
                   ) ORDER BY created_at ASC, seq ASC"#,
            )
            .bind(session_id.to_string())
            .bind(i64::from(n))
            .fetch_all(&self.pool.reader)
            .await,
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_messages(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::user::SqliteUserRepository;
    use chrono::Duration;
    use parley_core::repository::user::UserRepository;
    use parley_types::user::User;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn make_user(pool: &DatabasePool) -> User {
        SqliteUserRepository::new(pool.clone())
            .create_user(&User::new("tester"))
            .await
            .unwrap()
    }

    async fn make_session(repo: &SqliteChatRepository, user: &User) -> ChatSession {
        let session = ChatSession::new(user.id, Some("title".into()), Some("desc".into()));
        let first = ChatMessage::new(session.id, Some(user.id), MessageRole::User, "first");
        repo.create_session(&session, &first).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_session_writes_first_message() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;

        let session = make_session(&repo, &user).await;

        let loaded = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
        let messages = repo.get_messages(&session.id, None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[0].user_id, Some(user.id));
    }

    #[tokio::test]
    async fn test_create_session_is_atomic() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;

        let session = ChatSession::new(user.id, None, None);
        // First message points at an unknown user: the FK fails inside the transaction.
        let first = ChatMessage::new(session.id, Some(Uuid::now_v7()), MessageRole::User, "x");

        assert!(repo.create_session(&session, &first).await.is_err());
        assert!(repo.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_for_unknown_user_fails() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = ChatSession::new(Uuid::now_v7(), None, None);
        let first = ChatMessage::new(session.id, None, MessageRole::User, "x");

        let err = repo.create_session(&session, &first).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first_with_filter() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let alice = make_user(&pool).await;
        let bob = make_user(&pool).await;

        let a1 = make_session(&repo, &alice).await;
        let b1 = make_session(&repo, &bob).await;
        let a2 = make_session(&repo, &alice).await;

        let all = repo.list_sessions(None, None, None).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a2.id, b1.id, a1.id]);

        let alices = repo.list_sessions(Some(&alice.id), None, None).await.unwrap();
        assert_eq!(alices.len(), 2);

        let paged = repo.list_sessions(None, Some(1), Some(1)).await.unwrap();
        assert_eq!(paged[0].id, b1.id);

        let skipped = repo.list_sessions(None, None, Some(2)).await.unwrap();
        assert_eq!(skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_update_session_details_leaves_finish_alone() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let mut session = make_session(&repo, &user).await;

        session.title = Some("new title".into());
        session.finished_at = Some(Utc::now());
        repo.update_session_details(&session).await.unwrap();

        let loaded = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("new title"));
        assert!(loaded.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_session_is_not_found() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);
        let ghost = ChatSession::new(Uuid::now_v7(), None, None);
        let err = repo.update_session_details(&ghost).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_finish_session_once() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;

        let first = Utc::now();
        assert!(repo.finish_session(&session.id, first).await.unwrap());
        assert!(!repo
            .finish_session(&session.id, first + Duration::seconds(5))
            .await
            .unwrap());

        let loaded = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.finished_at, Some(first));

        let err = repo.finish_session(&Uuid::now_v7(), first).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_session_cascades_messages() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;
        let reply = ChatMessage::new(session.id, None, MessageRole::Assistant, "reply");
        repo.save_message(&reply).await.unwrap();

        repo.delete_session(&session.id).await.unwrap();

        assert!(repo.get_session(&session.id).await.unwrap().is_none());
        assert!(repo.get_message(&reply.id).await.unwrap().is_none());
        assert!(repo.get_messages(&session.id, None).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_session(&session.id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_messages_keep_write_order_on_equal_timestamps() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;

        let stamp = Utc::now() + Duration::seconds(1);
        let mut written = Vec::new();
        for i in 0..4 {
            let mut msg = ChatMessage::new(session.id, None, MessageRole::User, format!("m{i}"));
            msg.created_at = stamp;
            repo.save_message(&msg).await.unwrap();
            written.push(msg.id);
        }

        let history = repo.get_messages(&session.id, None).await.unwrap();
        let ids: Vec<Uuid> = history.iter().skip(1).map(|m| m.id).collect();
        assert_eq!(ids, written);

        let recent = repo.get_messages(&session.id, Some(2)).await.unwrap();
        let recent_ids: Vec<Uuid> = recent.iter().map(|m| m.id).collect();
        assert_eq!(recent_ids, written[2..].to_vec());
    }

    #[tokio::test]
    async fn test_message_round_trip_with_embedding() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;

        let mut msg = ChatMessage::new(session.id, Some(user.id), MessageRole::System, "안녕하세요");
        msg.embedding = Some(vec![0.25, -1.5]);
        repo.save_message(&msg).await.unwrap();

        let loaded = repo.get_message(&msg.id).await.unwrap().unwrap();
        assert_eq!(loaded, msg);
    }

    #[tokio::test]
    async fn test_update_and_delete_message() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;
        let mut msg = ChatMessage::new(session.id, None, MessageRole::User, "draft");
        repo.save_message(&msg).await.unwrap();

        msg.content = "final".into();
        msg.role = MessageRole::Assistant;
        repo.update_message(&msg).await.unwrap();
        let loaded = repo.get_message(&msg.id).await.unwrap().unwrap();
        assert_eq!(loaded.content, "final");
        assert_eq!(loaded.role, MessageRole::Assistant);

        repo.delete_message(&msg.id).await.unwrap();
        assert!(matches!(
            repo.delete_message(&msg.id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_list_messages_newest_first() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());
        let user = make_user(&pool).await;
        let session = make_session(&repo, &user).await;
        let later = ChatMessage::new(session.id, None, MessageRole::Assistant, "later")
            .not_before(Utc::now() + Duration::seconds(1));
        repo.save_message(&later).await.unwrap();

        let all = repo.list_messages(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, later.id);

        let limited = repo.list_messages(Some(1), Some(1)).await.unwrap();
        assert_eq!(limited[0].content, "first");
    }
}
