//! Session title generation via the completion gateway.
//!
//! `generate_title` asks the model for a short title and description seeded
//! by the first message. The reply is expected as labelled lines:
//!
//! ```text
//! 타이틀: Greeting
//! 설명: A greeting
//! ```
//!
//! When the call fails or yields nothing usable, callers fall back to
//! [`SessionTitle::fallback`], which truncates the first message.

use parley_types::config::ChatConfig;
use parley_types::error::GatewayError;
use parley_types::llm::{CompletionRequest, PromptMessage};

use crate::llm::box_gateway::BoxCompletionGateway;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 20;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 100;

const TITLE_LABELS: &[&str] = &["타이틀", "제목", "title"];
const DESCRIPTION_LABELS: &[&str] = &["설명", "description"];

/// Title and description for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTitle {
    pub title: String,
    pub description: String,
}

impl SessionTitle {
    /// Deterministic title derived from the first message alone.
    pub fn fallback(content: &str) -> Self {
        Self {
            title: truncate_chars(content, TITLE_MAX_CHARS),
            description: truncate_chars(content, DESCRIPTION_MAX_CHARS),
        }
    }
}

/// Generate a session title from the first user message.
///
/// Returns the gateway's error unchanged so the caller decides how to
/// degrade. An empty parsed title is reported as an upstream error.
#[tracing::instrument(
    name = "generate_title",
    skip(gateway, config, content),
    fields(
        gen_ai.operation.name = "generate_title",
        gen_ai.request.model = %gateway.model(),
    )
)]
pub async fn generate_title(
    gateway: &BoxCompletionGateway,
    config: &ChatConfig,
    content: &str,
) -> Result<SessionTitle, GatewayError> {
    let request = CompletionRequest {
        messages: vec![
            PromptMessage::system(config.title_system_prompt.clone()),
            PromptMessage::user(format!(
                "다음 대화의 제목과 설명을 생성해주세요. 제목은 {TITLE_MAX_CHARS}자 이내로, \
                 설명은 {DESCRIPTION_MAX_CHARS}자 이내로 작성해주세요. 대화 내용: {content}"
            )),
        ],
        max_tokens: config.title_max_tokens,
    };

    let response = gateway.complete(&request).await?;
    let (title, description) = parse_title_and_description(&response.content);

    let title = title.ok_or_else(|| {
        GatewayError::Upstream("title reply contained no usable title".to_string())
    })?;

    Ok(SessionTitle {
        title,
        description: description.unwrap_or_else(|| truncate_chars(content, DESCRIPTION_MAX_CHARS)),
    })
}

/// Extract a title and description from a labelled reply.
///
/// Labels are matched case-insensitively and accept `:` or `：`. Without a
/// title label the first unlabelled non-empty line is used. Values are
/// stripped of quotes and truncated to their maximum lengths.
pub fn parse_title_and_description(response: &str) -> (Option<String>, Option<String>) {
    let mut title = None;
    let mut description = None;
    let mut first_plain_line = None;

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_label(line) {
            Some((label, value)) if TITLE_LABELS.contains(&label.as_str()) => {
                if title.is_none() {
                    title = clean_value(value, TITLE_MAX_CHARS);
                }
            }
            Some((label, value)) if DESCRIPTION_LABELS.contains(&label.as_str()) => {
                if description.is_none() {
                    description = clean_value(value, DESCRIPTION_MAX_CHARS);
                }
            }
            _ => {
                if first_plain_line.is_none() {
                    first_plain_line = clean_value(line, TITLE_MAX_CHARS);
                }
            }
        }
    }

    (title.or(first_plain_line), description)
}

/// Split `label: value`, returning the lowercased label.
fn split_label(line: &str) -> Option<(String, &str)> {
    let idx = line.find([':', '：'])?;
    let label = line[..idx].trim().trim_matches(['*', '#', '-', ' ']).to_lowercase();
    let sep_len = line[idx..].chars().next()?.len_utf8();
    Some((label, &line[idx + sep_len..]))
}

fn clean_value(value: &str, max_chars: usize) -> Option<String> {
    let cleaned = value
        .trim()
        .trim_matches(['"', '\'', '*'])
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(truncate_chars(cleaned, max_chars))
    }
}

/// Truncate to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
