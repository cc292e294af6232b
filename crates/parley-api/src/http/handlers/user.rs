//! User HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/users      - Create a user
//! - GET  /api/v1/users      - List users
//! - GET  /api/v1/users/{id} - Get a single user

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use parley_types::user::User;

use super::{parse_uuid, required};
use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<Response, AppError> {
    let meta = RequestMeta::start();
    let name = required(body.name, "name")?;

    let user = state.chat_service.create_user(&name).await?;
    let link = format!("/api/v1/users/{}", user.id);

    Ok(meta
        .success(user)
        .with_link("self", &link)
        .with_status(StatusCode::CREATED))
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<AppState>) -> Result<ApiResponse<Vec<User>>, AppError> {
    let meta = RequestMeta::start();
    let users = state.chat_service.list_users().await?;
    Ok(meta.success(users).with_link("self", "/api/v1/users"))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<User>, AppError> {
    let meta = RequestMeta::start();
    let id = parse_uuid(&user_id)?;
    let user = state.chat_service.get_user(&id).await?;
    Ok(meta
        .success(user)
        .with_link("sessions", &format!("/api/v1/sessions?user_id={id}")))
}
