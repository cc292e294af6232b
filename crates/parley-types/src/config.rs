//! Tunable configuration types for Parley.
//!
//! `ChatConfig` represents the optional `config.toml` in the data directory
//! that controls token budgets, history windows, prompts, and timeouts.

use serde::{Deserialize, Serialize};

/// Number of most recent turns sent with a single-turn conversation request.
pub const CONVERSATION_HISTORY_LIMIT: u32 = 10;

/// Tunables for the completion pipeline.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum tokens the completion service may generate per reply.
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    /// Most recent N messages to include as session history (unset = all).
    #[serde(default)]
    pub history_limit: Option<u32>,

    /// Timeout for one call to the completion service.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fixed system instruction prepended to every session prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// System instruction for the auto-titling call.
    #[serde(default = "default_title_system_prompt")]
    pub title_system_prompt: String,

    /// Token budget for the auto-titling call.
    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,

    /// Allowed CORS origins (empty = any).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_max_completion_tokens() -> u32 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_system_prompt() -> String {
    "당신은 도움이 되는 AI 어시스턴트입니다. 응답은 간결하고 명확하게 해주세요.".to_string()
}

fn default_title_system_prompt() -> String {
    "당신은 대화의 맥락을 이해하고 적절한 제목과 설명을 생성하는 AI 어시스턴트입니다. \
     반드시 다음 형식으로만 답하세요:\n타이틀: <20자 이내 제목>\n설명: <100자 이내 설명>"
        .to_string()
}

fn default_title_max_tokens() -> u32 {
    200
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_completion_tokens: default_max_completion_tokens(),
            history_limit: None,
            request_timeout_secs: default_request_timeout_secs(),
            system_prompt: default_system_prompt(),
            title_system_prompt: default_title_system_prompt(),
            title_max_tokens: default_title_max_tokens(),
            cors_origins: Vec::new(),
        }
    }
}
