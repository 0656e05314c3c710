//! Demo SSE server
//!
//! Serves paginated data as a Server-Sent Events stream. Each connection
//! gets one page of ticks and a goodbye event with a short retry hint, so an
//! `EventSource` client reconnects right away and sees one endless stream.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sse_stream::server::SseServer;
//!
//! let server = SseServer::new(config, CancellationToken::new());
//! server.run().await?;
//! ```

pub mod routes;
pub mod ticker;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::types::Config;
use crate::error::{ConfigError, Result};

/// Shared state for the routes.
#[derive(Clone)]
pub struct ServerState {
    config: Arc<Config>,
    /// Parent of every connection's cancellation token.
    shutdown: CancellationToken,
}

impl ServerState {
    /// Creates new server state.
    pub fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            shutdown,
        }
    }
}

/// The demo SSE server.
pub struct SseServer {
    state: ServerState,
}

impl SseServer {
    /// Creates a server that stops when `shutdown` is cancelled.
    pub fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self {
            state: ServerState::new(config, shutdown),
        }
    }

    /// Returns the address the server will listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.state.config.server.host, self.state.config.server.port)
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(routes::health))
            .route("/health", get(routes::health))
            .route("/stream", get(routes::stream))
            .with_state(self.state.clone())
    }

    /// Runs the server until the shutdown token is cancelled.
    ///
    /// Open streams are cancelled with it and end without a goodbye event.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .addr()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.addr()))?;

        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("SSE server listening on http://{}", listener.local_addr()?);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("SSE server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_addr() {
        let server = SseServer::new(Config::default(), CancellationToken::new());
        assert_eq!(server.addr(), "127.0.0.1:9090");
    }

    #[tokio::test]
    async fn test_invalid_host_is_config_error() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        let server = SseServer::new(config, CancellationToken::new());

        let err = server.run().await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Config(ConfigError::InvalidAddress(_))));
    }
}
