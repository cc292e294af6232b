//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Span field names in `tracing` macros must be literal identifiers, so spans
//! spell out the dotted names (`gen_ai.request.model`, ...) and these
//! constants supply values and `Span::record` keys.

/// The finish reason reported for the response (e.g., "stop").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";
