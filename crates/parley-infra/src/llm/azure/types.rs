//! Azure OpenAI chat completions wire types.
//!
//! Provider-specific request/response shapes, kept separate from the
//! provider-agnostic types in parley-types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /openai/deployments/{deployment}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct AzureChatRequest {
    pub messages: Vec<AzureMessage>,
    pub max_completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AzureMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<AzureChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureChoice {
    #[serde(default)]
    pub message: Option<AzureChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body Azure returns on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureErrorBody {
    pub error: AzureErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
