//! Completion gateway abstractions for Parley.
//!
//! This module defines the boundary to the external completion service:
//! - `CompletionGateway`: RPITIT trait for concrete gateway implementations
//! - `BoxCompletionGateway`: Object-safe wrapper for dynamic dispatch
//! - `prompt`: assembly of ordered prompts from stored history

pub mod box_gateway;
pub mod gateway;
pub mod prompt;
