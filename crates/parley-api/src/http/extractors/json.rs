//! JSON body extractor.

use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;

use crate::http::error::AppError;

/// `axum::Json` with an [`AppError::Validation`] rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("invalid request body: {}", rejection.body_text()))
    }
}
