//! Request extractors that reject with the envelope error format.
//!
//! axum's stock `Json`/`Query` rejections are plain text (and `Json` uses
//! 422); these wrappers turn them into `400 VALIDATION_ERROR` envelopes.

pub mod json;
pub mod query;
