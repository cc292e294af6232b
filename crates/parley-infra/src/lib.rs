//! Infrastructure layer for Parley.
//!
//! Implements the ports defined in `parley-core`: SQLite repositories, the
//! Azure OpenAI completion gateway, and the `config.toml` loader.

pub mod config;
pub mod llm;
pub mod sqlite;
