//! REST HTTP server.

use std::future::Future;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::routes;
use crate::state::AppState;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Every resource plus `/health`, with request tracing.
pub fn router(state: AppState) -> Router {
    routes::router()
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the REST server.
pub async fn serve(state: AppState, config: ServerConfig) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ REST server listening on http://{}", addr);

    axum::serve(listener, router(state)).await
}

/// Start the REST server with graceful shutdown support.
pub async fn serve_with_shutdown<F>(
    state: AppState,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    debug!(addr = %addr, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
