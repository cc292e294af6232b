//! Query parameter extractors for list endpoints.

use axum::extract::FromRequestParts;
use axum::extract::rejection::QueryRejection;
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;

/// `axum::extract::Query` with an [`AppError::Validation`] rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("invalid query string: {}", rejection.body_text()))
    }
}

/// Query parameters for the session list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SessionListQuery {
    /// Only sessions owned by this user.
    pub user_id: Option<Uuid>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}

/// Query parameters for the message list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct MessageListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SessionListQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        check_paging(self.limit, self.offset)
    }
}

impl MessageListQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        check_paging(self.limit, self.offset)
    }
}

fn check_paging(limit: Option<i64>, offset: Option<i64>) -> Result<(), AppError> {
    if limit.is_some_and(|l| l < 0) || offset.is_some_and(|o| o < 0) {
        return Err(AppError::Validation("limit and offset must be non-negative".to_string()));
    }
    Ok(())
}
