//! Azure OpenAI completion gateway.
//!
//! [`AzureOpenAiGateway`] implements
//! [`CompletionGateway`](parley_core::llm::gateway::CompletionGateway) for the
//! Azure OpenAI chat completions API.

pub mod client;
pub mod config;
pub mod types;

pub use client::AzureOpenAiGateway;
pub use config::AzureOpenAiConfig;
