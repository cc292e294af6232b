//! Completion gateway implementations.
//!
//! Contains the concrete [`CompletionGateway`](parley_core::llm::gateway::CompletionGateway)
//! backends and a factory ([`create_gateway`]) that builds the configured one
//! from the environment.

pub mod azure;

use std::time::Duration;

use parley_core::llm::box_gateway::BoxCompletionGateway;
use parley_core::llm::gateway::CompletionGateway;
use parley_types::error::GatewayError;

use self::azure::{AzureOpenAiConfig, AzureOpenAiGateway};

/// Build the Azure OpenAI gateway from `AZURE_OPENAI_*` environment variables.
///
/// Called once at process start; a `GatewayError::Configuration` here means
/// the process must not serve traffic.
pub fn create_gateway(timeout: Duration) -> Result<BoxCompletionGateway, GatewayError> {
    let gateway = AzureOpenAiGateway::new(AzureOpenAiConfig::from_env(timeout))?;
    tracing::info!(
        gateway = "azure_openai",
        deployment = gateway.model(),
        "Completion gateway configured"
    );
    Ok(BoxCompletionGateway::new(gateway))
}
