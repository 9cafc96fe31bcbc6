// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use haggle_config::model::ServerConfig;
use haggle_core::api::paths;
use haggle_core::HaggleError;
use haggle_storage::SqliteStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<SqliteStore>,
}

impl GatewayState {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

/// Build the router with every persistence route.
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route(paths::HEALTH, get(handlers::health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(paths::CREATE_CONVERSATION, post(handlers::create_conversation))
        .route(paths::PENDING_CONVERSATIONS, get(handlers::pending_conversations))
        .route(paths::LIST_MESSAGES, get(handlers::list_messages))
        .route(paths::MESSAGE_EXISTS, get(handlers::message_exists))
        .route(paths::SEND_MESSAGE, post(handlers::send_message))
        .route(paths::RECEIVE_MESSAGE, post(handlers::receive_message))
        .route(paths::UPDATE_LISTING_INFO, post(handlers::update_listing_info))
        .route(paths::LISTING_INFO, get(handlers::listing_info))
        .route(paths::UPDATE_SEARCHED_INFO, post(handlers::update_searched_info))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener for `config.host:config.port`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, HaggleError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| HaggleError::Config(format!("failed to bind gateway to {addr}: {e}")))
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HaggleError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gateway listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| HaggleError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
