//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/sessions                 - Create a session with its first message
//! - GET    /api/v1/sessions                 - List sessions (newest first)
//! - GET    /api/v1/sessions/{id}            - Get a single session
//! - PUT    /api/v1/sessions/{id}            - Rewrite title/description
//! - DELETE /api/v1/sessions/{id}            - Delete a session and its messages
//! - POST   /api/v1/sessions/{id}/finish     - Close a session
//! - GET    /api/v1/sessions/{id}/messages   - Ordered session history
//! - POST   /api/v1/sessions/{id}/completion - Send a message, get the reply

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::chat::service::SessionPatch;
use parley_types::chat::{ChatMessage, ChatSession, CompletionExchange};
use parley_types::error::ChatError;

use super::{parse_uuid, required};
use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::query::{ApiQuery, SessionListQuery};
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Accepts either `content` or `message` as the user turn.
#[derive(Debug, Deserialize)]
pub struct CompletionRequestBody {
    pub content: Option<String>,
    pub message: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct FinishedSession {
    pub id: Uuid,
    pub finish_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSessionRequest>,
) -> Result<Response, AppError> {
    let meta = RequestMeta::start();
    let user_id = required(body.user_id, "user_id")?;
    let content = required(body.content, "content")?;

    // An id that is not a UUID cannot name an existing user.
    let user_id: Uuid = user_id
        .parse()
        .map_err(|_| AppError::Chat(ChatError::NotFound("user".to_string())))?;

    let session = state.orchestrator.create_session(&user_id, &content).await?;
    let link = format!("/api/v1/sessions/{}", session.id);

    Ok(meta
        .success(session)
        .with_link("self", &link)
        .with_link("messages", &format!("{link}/messages"))
        .with_status(StatusCode::CREATED))
}

/// GET /api/v1/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionListQuery>,
) -> Result<ApiResponse<Vec<ChatSession>>, AppError> {
    let meta = RequestMeta::start();
    query.validate()?;

    let sessions = state
        .chat_service
        .list_sessions(query.user_id.as_ref(), query.limit, query.offset)
        .await?;

    Ok(meta.success(sessions).with_link("self", "/api/v1/sessions"))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let meta = RequestMeta::start();
    let sid = parse_uuid(&session_id)?;

    let session = state.chat_service.get_session(&sid).await?;

    Ok(meta
        .success(session)
        .with_link("self", &format!("/api/v1/sessions/{sid}"))
        .with_link("messages", &format!("/api/v1/sessions/{sid}/messages")))
}

/// PUT /api/v1/sessions/{id}
pub async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<UpdateSessionRequest>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let meta = RequestMeta::start();
    let sid = parse_uuid(&session_id)?;

    if body.title.is_none() && body.description.is_none() {
        return Err(AppError::Validation(
            "at least one of title or description is required".to_string(),
        ));
    }

    let session = state
        .chat_service
        .update_session(
            &sid,
            SessionPatch {
                title: body.title,
                description: body.description,
            },
        )
        .await?;

    Ok(meta
        .success(session)
        .with_link("self", &format!("/api/v1/sessions/{sid}")))
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let sid = parse_uuid(&session_id)?;
    state.chat_service.delete_session(&sid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/{id}/finish
pub async fn finish_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<FinishedSession>, AppError> {
    let meta = RequestMeta::start();
    let sid = parse_uuid(&session_id)?;

    let session = state.chat_service.finish_session(&sid).await?;

    Ok(meta
        .success(FinishedSession {
            id: session.id,
            finish_at: session.finished_at,
        })
        .with_link("session", &format!("/api/v1/sessions/{sid}")))
}

/// GET /api/v1/sessions/{id}/messages
pub async fn get_session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let meta = RequestMeta::start();
    let sid = parse_uuid(&session_id)?;

    let messages = state.chat_service.session_history(&sid).await?;

    Ok(meta
        .success(messages)
        .with_link("self", &format!("/api/v1/sessions/{sid}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{sid}")))
}

/// POST /api/v1/sessions/{id}/completion
pub async fn complete(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<CompletionRequestBody>,
) -> Result<ApiResponse<CompletionExchange>, AppError> {
    let meta = RequestMeta::start();
    let sid = parse_uuid(&session_id)?;
    let content = body.content.or(body.message).unwrap_or_default();

    tracing::debug!(session_id = %sid, "Completion requested");
    let exchange = state
        .orchestrator
        .send_message(&sid, &content, body.user_id)
        .await?;

    Ok(meta
        .success(exchange)
        .with_link("messages", &format!("/api/v1/sessions/{sid}/messages")))
}
