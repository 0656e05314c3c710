use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub stream: StreamConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Flushed frames that may queue per connection before the stream waits
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            channel_capacity: 32,
        }
    }
}

/// Demo stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Ticks sent per connection before the stream says goodbye
    pub page_size: u64,
    /// Delay between ticks; zero sends the page as fast as the client reads
    pub interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            interval_ms: 1000,
        }
    }
}
