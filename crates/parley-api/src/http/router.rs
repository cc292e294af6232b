//! Axum router configuration with middleware.
//!
//! All resource routes are under `/api/v1/`; `/` and `/health` sit at the root.
//! Middleware: CORS (origins from `config.toml`, any when unset) and tracing.

use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::response::json_response;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        // Users
        .route(
            "/users",
            post(handlers::user::create_user).get(handlers::user::list_users),
        )
        .route("/users/{id}", get(handlers::user::get_user))
        // Sessions
        .route(
            "/sessions",
            post(handlers::session::create_session).get(handlers::session::list_sessions),
        )
        .route(
            "/sessions/{id}",
            get(handlers::session::get_session)
                .put(handlers::session::update_session)
                .delete(handlers::session::delete_session),
        )
        .route("/sessions/{id}/finish", post(handlers::session::finish_session))
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_session_messages),
        )
        .route("/sessions/{id}/completion", post(handlers::session::complete))
        // Messages
        .route(
            "/messages",
            post(handlers::message::create_message).get(handlers::message::list_messages),
        )
        .route(
            "/messages/{id}",
            get(handlers::message::get_message)
                .put(handlers::message::update_message)
                .delete(handlers::message::delete_message),
        )
        // Stateless conversation
        .route(
            "/chat/completion",
            post(handlers::completion::complete_single_turn),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

/// GET / - Welcome message.
async fn welcome() -> Response {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "message": "Welcome to the Parley chat API",
            "docs": "/api/v1",
        }),
    )
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> Response {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}
