//! Stateless single-turn completion.
//!
//! - POST /api/v1/chat/completion - `{message, history?}` -> `{message, response}`
//!
//! Nothing is persisted; the caller owns the history.

use axum::extract::State;
use serde::Deserialize;

use parley_types::chat::SingleTurnReply;
use parley_types::llm::PromptMessage;

use super::required;
use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SingleTurnRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<PromptMessage>,
}

/// POST /api/v1/chat/completion
pub async fn complete_single_turn(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SingleTurnRequest>,
) -> Result<ApiResponse<SingleTurnReply>, AppError> {
    let meta = RequestMeta::start();
    let message = required(body.message, "message")?;

    let reply = state
        .orchestrator
        .complete_single_turn(&message, &body.history)
        .await?;

    Ok(meta.success(reply))
}
