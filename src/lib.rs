//! # SSE Stream
//!
//! Delivers incremental results from an API server to browser `EventSource`
//! clients as Server-Sent Events, without the client re-polling.
//!
//! ## Features
//!
//! - **Event Model**: domain objects convert themselves into SSE events (`sse-core`)
//! - **Stream Driver**: per-connection loop with hello/goodbye sentinels and cancellation (`sse-server`)
//! - **Demo Server**: paginated data delivered as one continuous stream
//! - **Framing Tool**: prints the wire form of a single event
//!
//! ## Example
//!
//! ```rust
//! use sse_stream::render_frame;
//!
//! let frame = render_frame(Some(r#"{"x":1}"#), Some("42"), None, 500, None).unwrap();
//! assert_eq!(frame, "retry: 500\nid: 42\ndata: {\"x\":1}\n\n");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod server;

use std::time::Duration;

pub use error::{AppError, Result};
use cli::Commands;
use config::types::Config;
use server::SseServer;
use sse_server::{format_event, Event, JsonValue};
use tokio_util::sync::CancellationToken;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Serve {
            host,
            port,
            page_size,
            interval_ms,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(page_size) = page_size {
                config.stream.page_size = page_size;
            }
            if let Some(interval_ms) = interval_ms {
                config.stream.interval_ms = interval_ms;
            }
            log::info!(
                "Serving pages of {} ticks every {:?}",
                config.stream.page_size,
                Duration::from_millis(config.stream.interval_ms)
            );

            let shutdown = CancellationToken::new();
            let on_signal = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        log::info!("Shutting down, closing open streams");
                        on_signal.cancel();
                    }
                    Err(e) => log::warn!("Unable to listen for shutdown signal: {}", e),
                }
            });

            SseServer::new(config, shutdown).run().await
        }
        Commands::Frame {
            data,
            id,
            event,
            retry,
            error,
        } => {
            let frame = render_frame(
                data.as_deref(),
                id.as_deref(),
                event.as_deref(),
                retry,
                error.as_deref(),
            )?;
            print!("{}", frame);
            Ok(())
        }
    }
}

/// Renders one event in the SSE wire format.
///
/// `data` must be valid JSON. When `error` is given the event is an error
/// event and the other fields are ignored.
pub fn render_frame(
    data: Option<&str>,
    id: Option<&str>,
    event_type: Option<&str>,
    retry: u64,
    error: Option<&str>,
) -> Result<String> {
    let event: Event<JsonValue> = match (error, data) {
        (Some(message), _) => Event::error(message),
        (None, Some(data)) => {
            let value = serde_json::from_str(data)
                .map_err(|e| AppError::InvalidInput(format!("payload is not valid JSON: {}", e)))?;
            Event::new(value)
                .with_id(id.unwrap_or_default().to_string())
                .with_event_type(event_type.unwrap_or_default().to_string())
                .with_retry(retry)
        }
        (None, None) => return Err(AppError::InvalidInput("either a payload or an error is required".into())),
    };
    Ok(format_event(&event)?)
}
