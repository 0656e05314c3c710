//! HTTP Routes for the demo SSE server
//!
//! - `/stream` - one page of ticks as an SSE stream
//! - `/health` - Health check endpoint

use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sse_server::sse_response;
use tracing::debug;

use super::ticker::{run_page, Page, TickItem};
use super::ServerState;

/// Query parameters of `/stream`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Last sequence number the client has seen.
    #[serde(default)]
    pub cursor: u64,
    /// Sequence number to deliver as an error event.
    pub fail: Option<u64>,
}

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "sse-stream",
        "protocol": "sse"
    }))
}

/// SSE endpoint streaming one page of ticks after `cursor`.
pub async fn stream(State(state): State<ServerState>, Query(query): Query<StreamQuery>) -> Response {
    let capacity = state.config.server.channel_capacity;
    let page = Page {
        cursor: query.cursor,
        len: state.config.stream.page_size,
        interval: Duration::from_millis(state.config.stream.interval_ms),
        fail: query.fail,
    };
    debug!(cursor = page.cursor, len = page.len, "opening tick stream");

    let (sender, streamer) = sse_server::channel::<TickItem>(capacity.max(1), state.shutdown.child_token());
    tokio::spawn(run_page(sender, page));

    sse_response(streamer, capacity).await
}
