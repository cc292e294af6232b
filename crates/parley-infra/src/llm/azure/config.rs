//! Azure OpenAI connection settings.
//!
//! Resolved once at startup. Placeholder values shipped in sample `.env`
//! files are rejected here so a misconfigured process never serves traffic.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_types::error::GatewayError;

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

const PLACEHOLDER_KEY: &str = "dummy-key";
const PLACEHOLDER_ENDPOINT: &str = "dummy-endpoint";
const PLACEHOLDER_DEPLOYMENT: &str = "dummy-deployment";

/// Settings for [`super::AzureOpenAiGateway`].
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: SecretString,
    pub api_version: String,
    /// Deployment name the requests are routed to.
    pub deployment: String,
    pub timeout: Duration,
}

impl AzureOpenAiConfig {
    /// Read settings from the `AZURE_OPENAI_*` environment variables.
    ///
    /// Missing variables become empty strings and are reported by
    /// [`validate`](Self::validate).
    pub fn from_env(timeout: Duration) -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let api_version = std::env::var(ENV_API_VERSION).unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        Self {
            endpoint: var(ENV_ENDPOINT),
            api_key: SecretString::from(var(ENV_API_KEY)),
            api_version,
            deployment: var(ENV_DEPLOYMENT),
            timeout,
        }
    }

    /// Reject empty or placeholder values. Never echoes the key.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let key = self.api_key.expose_secret().trim();
        if key.is_empty() || key == PLACEHOLDER_KEY {
            return Err(GatewayError::Configuration(format!(
                "{ENV_API_KEY} is unset or a placeholder"
            )));
        }

        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() || endpoint.contains(PLACEHOLDER_ENDPOINT) {
            return Err(GatewayError::Configuration(format!(
                "{ENV_ENDPOINT} is unset or a placeholder"
            )));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(GatewayError::Configuration(format!(
                "{ENV_ENDPOINT} must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let deployment = self.deployment.trim();
        if deployment.is_empty() || deployment == PLACEHOLDER_DEPLOYMENT {
            return Err(GatewayError::Configuration(format!(
                "{ENV_DEPLOYMENT} is unset or a placeholder"
            )));
        }

        if self.api_version.trim().is_empty() {
            return Err(GatewayError::Configuration(format!("{ENV_API_VERSION} is empty")));
        }

        if self.timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
