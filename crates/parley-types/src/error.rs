use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the completion gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required configuration is missing or still a placeholder value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure, non-success status, timeout, or empty reply.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Errors surfaced by chat operations.
///
/// Every core service operation returns this taxonomy; the HTTP layer maps
/// each variant to a status code.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound("entity".to_string()),
            other => ChatError::Persistence(other.to_string()),
        }
    }
}

impl From<GatewayError> for ChatError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Upstream(msg) => ChatError::Upstream(msg),
            GatewayError::Configuration(msg) => {
                ChatError::Upstream(format!("completion service misconfigured: {msg}"))
            }
        }
    }
}
