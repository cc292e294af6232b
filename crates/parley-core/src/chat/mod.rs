//! Chat sessions, messages, and the completion pipeline.
//!
//! - `repository`: the `ChatRepository` port for sessions and messages
//! - `context`: ordered, bounded history reads
//! - `service`: user/session/message CRUD and the open -> closed transition
//! - `orchestrator`: send-a-message pipeline and auto-titled session creation
//! - `title`: parsing and fallback for generated titles

pub mod context;
pub mod orchestrator;
pub mod repository;
pub mod service;
pub mod title;
