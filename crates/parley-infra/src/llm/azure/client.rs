//! AzureOpenAiGateway -- concrete [`CompletionGateway`] for Azure OpenAI.
//!
//! Sends non-streaming requests to the chat completions endpoint of one
//! deployment. The API key is wrapped in [`secrecy::SecretString`], only
//! exposed when building the `api-key` header, and scrubbed from any error
//! text before it leaves this module.

use secrecy::{ExposeSecret, SecretString};
use tracing::{Instrument, debug, warn};

use parley_core::llm::gateway::CompletionGateway;
use parley_observe::genai_attrs;
use parley_types::error::GatewayError;
use parley_types::llm::{CompletionRequest, CompletionResponse};

use super::config::AzureOpenAiConfig;
use super::types::{AzureChatRequest, AzureChatResponse, AzureErrorBody, AzureMessage};

const REDACTED: &str = "[REDACTED]";

/// Azure OpenAI completion gateway.
///
/// Deliberately not `Debug`: the key must never reach log output.
pub struct AzureOpenAiGateway {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    deployment: String,
    api_version: String,
    timeout_secs: u64,
}

impl AzureOpenAiGateway {
    /// Validate `config` and build the HTTP client.
    ///
    /// Fails with `GatewayError::Configuration` on empty or placeholder
    /// settings; no network call is made.
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            deployment: config.deployment.trim().to_string(),
            api_version: config.api_version.trim().to_string(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Chat completions URL without the query string.
    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn to_azure_request(request: &CompletionRequest) -> AzureChatRequest {
        AzureChatRequest {
            messages: request
                .messages
                .iter()
                .map(|m| AzureMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_completion_tokens: request.max_tokens,
        }
    }

    /// Strip the key from text that may echo request details.
    fn redact(&self, text: &str) -> String {
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            text.to_string()
        } else {
            text.replace(key, REDACTED)
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Upstream(format!("request timed out after {}s", self.timeout_secs))
        } else {
            GatewayError::Upstream(self.redact(&format!("HTTP request failed: {e}")))
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        let body = Self::to_azure_request(request);

        let response = self
            .client
            .post(self.url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<AzureErrorBody>(&error_body)
                .ok()
                .and_then(|b| match (b.error.code, b.error.message) {
                    (Some(code), Some(message)) => Some(format!("{code}: {message}")),
                    (None, Some(message)) => Some(message),
                    (Some(code), None) => Some(code),
                    (None, None) => None,
                })
                .unwrap_or(error_body);
            return Err(GatewayError::Upstream(
                self.redact(&format!("HTTP {status}: {detail}")),
            ));
        }

        let azure_resp: AzureChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        let choice = azure_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Upstream("response contained no choices".to_string()))?;

        let content = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GatewayError::Upstream("response choice had no content".to_string()))?;

        Ok(CompletionResponse {
            content,
            model: azure_resp.model,
            finish_reason: choice.finish_reason,
        })
    }
}

impl CompletionGateway for AzureOpenAiGateway {
    fn name(&self) -> &str {
        "azure_openai"
    }

    fn model(&self) -> &str {
        &self.deployment
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, GatewayError> {
        let span = tracing::info_span!(
            "gen_ai.complete",
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = self.name(),
            gen_ai.request.model = %self.deployment,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.response.finish_reasons = tracing::field::Empty,
        );

        async {
            debug!(endpoint = %self.endpoint, messages = request.messages.len(), "Sending completion request");
            match self.send(request).await {
                Ok(response) => {
                    tracing::Span::current().record(
                        genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS,
                        response.finish_reason.as_deref().unwrap_or("unknown"),
                    );
                    Ok(response)
                }
                Err(e) => {
                    warn!(endpoint = %self.endpoint, deployment = %self.deployment, error = %e, "Completion request failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
