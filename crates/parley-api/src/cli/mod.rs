//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the REST API;
//! `user` bootstraps users without going through HTTP.

pub mod user;

use clap::{Parser, Subcommand};
use parley_observe::tracing_setup::LogFormat;

/// Chat-history backend with LLM completions.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format (text or json).
    #[arg(long, env = "PARLEY_LOG_FORMAT", default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Database connection string (default: sqlite://{data_dir}/parley.db).
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default filter directive derived from `-v` / `--quiet`.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "info,parley=debug,parley_core=debug,parley_infra=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "PARLEY_PORT", default_value = "5000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, env = "PARLEY_HOST", default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user.
    Create {
        /// Display name.
        name: String,
    },

    /// List all users.
    #[command(alias = "ls")]
    List,
}
