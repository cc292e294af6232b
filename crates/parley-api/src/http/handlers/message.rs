//! Message HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/messages      - Create a message in an open session
//! - GET    /api/v1/messages      - List messages (newest first)
//! - GET    /api/v1/messages/{id} - Get a single message
//! - PUT    /api/v1/messages/{id} - Rewrite content and/or role
//! - DELETE /api/v1/messages/{id} - Delete a message

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use parley_core::chat::service::{MessagePatch, NewMessage};
use parley_types::chat::{ChatMessage, MessageRole};

use super::{parse_uuid, required};
use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::query::{ApiQuery, MessageListQuery};
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub session_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub content: Option<String>,
    /// Defaults to `user`.
    pub role: Option<MessageRole>,
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: Option<String>,
    pub role: Option<MessageRole>,
}

/// POST /api/v1/messages
pub async fn create_message(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateMessageRequest>,
) -> Result<Response, AppError> {
    let meta = RequestMeta::start();
    let session_id = body
        .session_id
        .ok_or_else(|| AppError::Validation("session_id is required".to_string()))?;
    let content = required(body.content, "content")?;

    let message = state
        .chat_service
        .create_message(NewMessage {
            session_id,
            user_id: body.user_id,
            content,
            role: body.role.unwrap_or(MessageRole::User),
            embedding: body.vector,
        })
        .await?;
    let link = format!("/api/v1/messages/{}", message.id);

    Ok(meta
        .success(message)
        .with_link("self", &link)
        .with_link("session", &format!("/api/v1/sessions/{session_id}"))
        .with_status(StatusCode::CREATED))
}

/// GET /api/v1/messages
pub async fn list_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MessageListQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let meta = RequestMeta::start();
    query.validate()?;

    let messages = state
        .chat_service
        .list_messages(query.limit, query.offset)
        .await?;

    Ok(meta.success(messages).with_link("self", "/api/v1/messages"))
}

/// GET /api/v1/messages/{id}
pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let meta = RequestMeta::start();
    let id = parse_uuid(&message_id)?;
    let message = state.chat_service.get_message(&id).await?;
    let session_link = format!("/api/v1/sessions/{}", message.session_id);

    Ok(meta
        .success(message)
        .with_link("self", &format!("/api/v1/messages/{id}"))
        .with_link("session", &session_link))
}

/// PUT /api/v1/messages/{id}
pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    ApiJson(body): ApiJson<UpdateMessageRequest>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let meta = RequestMeta::start();
    let id = parse_uuid(&message_id)?;

    if body.content.is_none() && body.role.is_none() {
        return Err(AppError::Validation(
            "at least one of content or role is required".to_string(),
        ));
    }

    let message = state
        .chat_service
        .update_message(
            &id,
            MessagePatch {
                content: body.content,
                role: body.role,
            },
        )
        .await?;

    Ok(meta
        .success(message)
        .with_link("self", &format!("/api/v1/messages/{id}")))
}

/// DELETE /api/v1/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&message_id)?;
    state.chat_service.delete_message(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
