//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, installs tracing, then either starts the REST API
//! server or runs a user bootstrap command.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;
use parley_infra::sqlite::pool::{default_data_dir, default_database_url};
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Best effort: a missing .env is normal in production.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing(cli.log_format, cli.log_directive(), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "parley exited with an error");
    }

    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = default_data_dir();
    let database_url = cli.database_url.clone().unwrap_or_else(default_database_url);

    match cli.command {
        Commands::Serve { port, host } => {
            // Configuration errors surface here, before anything binds.
            let state = AppState::init(data_dir, &database_url).await?;
            let db_pool = state.db_pool.clone();

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            tracing::info!(%addr, "Parley API listening");
            if !cli.quiet {
                println!(
                    "  {} Parley API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            db_pool.close().await;
            tracing::info!("Server stopped");
        }

        Commands::User { action } => {
            let db_pool = state::open_database(&data_dir, &database_url).await?;
            let service = state::chat_service(&db_pool);

            let outcome = match action {
                UserCommand::Create { name } => cli::user::create_user(&service, &name, cli.json).await,
                UserCommand::List => cli::user::list_users(&service, cli.json).await,
            };

            db_pool.close().await;
            outcome?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
