//! Completion Orchestrator: the send-a-message pipeline.
//!
//! Sequences persistence and gateway calls into single user-facing actions:
//!
//! - `send_message`: persist the user turn, build the prompt from history,
//!   call the gateway, persist the assistant turn.
//! - `create_session`: open a session with its first message and a
//!   best-effort generated title.
//! - `complete_single_turn`: stateless completion over caller-supplied
//!   history; nothing is persisted.
//!
//! The user message is committed before the gateway call. If the call
//! fails, that message stays persisted and no assistant message is
//! written, so a retry re-reads the earlier user turn as history.

use std::sync::Arc;

use parley_types::chat::{ChatMessage, ChatSession, CompletionExchange, MessageRole, SingleTurnReply};
use parley_types::config::{CONVERSATION_HISTORY_LIMIT, ChatConfig};
use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, PromptMessage};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::context::{ContextBuilder, last_write_at};
use super::repository::ChatRepository;
use super::title::{SessionTitle, generate_title};
use crate::llm::box_gateway::BoxCompletionGateway;
use crate::llm::prompt::{build_session_prompt, build_single_turn_prompt};
use crate::repository::user::UserRepository;

/// Runs completions against a session and persists both sides.
///
/// The gateway is injected explicitly; there is no process-wide client.
pub struct CompletionOrchestrator<C: ChatRepository, U: UserRepository> {
    chat_repo: C,
    user_repo: U,
    gateway: Arc<BoxCompletionGateway>,
    config: ChatConfig,
}

impl<C: ChatRepository, U: UserRepository> CompletionOrchestrator<C, U> {
    pub fn new(chat_repo: C, user_repo: U, gateway: Arc<BoxCompletionGateway>, config: ChatConfig) -> Self {
        Self {
            chat_repo,
            user_repo,
            gateway,
            config,
        }
    }

    /// Send a user message into a session and return both persisted turns.
    pub async fn send_message(
        &self,
        session_id: &Uuid,
        content: &str,
        user_id: Option<Uuid>,
    ) -> Result<CompletionExchange, ChatError> {
        let session = self
            .chat_repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("session".to_string()))?;

        if content.trim().is_empty() {
            return Err(ChatError::Validation("content is required".to_string()));
        }
        if !session.is_open() {
            return Err(ChatError::InvalidState(
                "cannot send messages to a finished session".to_string(),
            ));
        }

        if let Some(user_id) = &user_id {
            if self.user_repo.get_user(user_id).await?.is_none() {
                return Err(ChatError::NotFound("user".to_string()));
            }
        }

        let floor = last_write_at(&self.chat_repo, &session).await?;
        let user_message = ChatMessage::new(
            *session_id,
            user_id.or(Some(session.user_id)),
            MessageRole::User,
            content,
        )
        .not_before(floor);
        self.chat_repo.save_message(&user_message).await?;

        // The window counts the new turn, which is appended separately below.
        let history: Vec<ChatMessage> = ContextBuilder::new(&self.chat_repo)
            .with_limit(self.config.history_limit)
            .build(session_id)
            .await?
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();

        let request = CompletionRequest {
            messages: build_session_prompt(&self.config.system_prompt, &history, content),
            max_tokens: self.config.max_completion_tokens,
        };

        let response = match self.gateway.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    session_id = %session_id,
                    user_message_id = %user_message.id,
                    gateway = self.gateway.name(),
                    error = %e,
                    "Completion failed; user message kept without reply"
                );
                return Err(e.into());
            }
        };

        let assistant_message = ChatMessage::new(
            *session_id,
            user_message.user_id,
            MessageRole::Assistant,
            response.content.trim(),
        )
        .not_before(user_message.created_at);
        self.chat_repo.save_message(&assistant_message).await?;

        info!(
            session_id = %session_id,
            history_len = history.len(),
            reply_chars = assistant_message.content.chars().count(),
            "Completion persisted"
        );

        Ok(CompletionExchange {
            user_message,
            assistant_message,
        })
    }

    /// Create a session seeded with its first message.
    ///
    /// The title comes from the gateway when it answers usefully and from
    /// [`SessionTitle::fallback`] otherwise; titling never fails creation.
    pub async fn create_session(&self, user_id: &Uuid, content: &str) -> Result<ChatSession, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("content is required".to_string()));
        }
        if self.user_repo.get_user(user_id).await?.is_none() {
            return Err(ChatError::NotFound("user".to_string()));
        }

        let titled = match generate_title(&self.gateway, &self.config, content).await {
            Ok(titled) => titled,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Title generation failed, using fallback");
                SessionTitle::fallback(content)
            }
        };

        let session = ChatSession::new(*user_id, Some(titled.title), Some(titled.description));
        let first_message = ChatMessage::new(session.id, Some(*user_id), MessageRole::User, content)
            .not_before(session.created_at);

        let session = self.chat_repo.create_session(&session, &first_message).await?;
        info!(session_id = %session.id, user_id = %user_id, "Session created");
        Ok(session)
    }

    /// Stateless completion: `[system, ...history, user]`, nothing persisted.
    ///
    /// Only the most recent turns are sent, bounded by
    /// [`CONVERSATION_HISTORY_LIMIT`] counting the new message.
    pub async fn complete_single_turn(
        &self,
        message: &str,
        history: &[PromptMessage],
    ) -> Result<SingleTurnReply, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::Validation("message is required".to_string()));
        }

        let request = CompletionRequest {
            messages: build_single_turn_prompt(
                &self.config.system_prompt,
                history,
                message,
                CONVERSATION_HISTORY_LIMIT,
            ),
            max_tokens: self.config.max_completion_tokens,
        };

        let response = self.gateway.complete(&request).await.map_err(|e| {
            error!(gateway = self.gateway.name(), error = %e, "Single-turn completion failed");
            ChatError::from(e)
        })?;

        Ok(SingleTurnReply {
            message: message.to_string(),
            response: response.content.trim().to_string(),
        })
    }
}
