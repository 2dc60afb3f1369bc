// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::{handlers::health_handler, handlers::root_handler, vectorize::vectorize_handler};
use crate::vectorize::Vectorizer;

/// State shared by every request; nothing in it is mutated after startup
#[derive(Debug, Clone)]
pub struct AppState {
    pub vectorizer: Arc<Vectorizer>,
    /// Optional upper bound on words per request
    pub max_words: Option<usize>,
}

impl AppState {
    pub fn new(vectorizer: Vectorizer, max_words: Option<usize>) -> Self {
        Self {
            vectorizer: Arc::new(vectorizer),
            max_words,
        }
    }
}

/// Builds the router with wide-open CORS and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness check
        .route("/", get(root_handler))
        // Model details
        .route("/health", get(health_handler))
        // Word graph endpoint
        .route("/vectorize", post(vectorize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serves until Ctrl-C / SIGTERM
pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}
