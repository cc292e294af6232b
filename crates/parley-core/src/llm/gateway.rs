//! CompletionGateway trait definition.
//!
//! This is the abstraction every completion backend implements. The
//! orchestrator receives an instance explicitly, so tests substitute a
//! double instead of reaching for a process-wide client.

use parley_types::error::GatewayError;
use parley_types::llm::{CompletionRequest, CompletionResponse};

/// Trait for completion service backends (Azure OpenAI, test doubles, ...).
///
/// Construction of a concrete gateway is where configuration is validated;
/// a constructed gateway is assumed usable. Implementations live in
/// parley-infra (e.g., `AzureOpenAiGateway`).
pub trait CompletionGateway: Send + Sync {
    /// Human-readable backend name (e.g., "azure_openai").
    fn name(&self) -> &str;

    /// Model or deployment identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send a prompt and receive the generated reply.
    ///
    /// Fails with `GatewayError::Upstream` on transport failure, timeout,
    /// non-success status, or an empty/absent choice.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, GatewayError>> + Send;
}
