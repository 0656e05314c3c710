use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sse-ctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve and inspect Server-Sent Events streams")]
#[command(long_about = "Runs a demo Server-Sent Events server that delivers paginated data as one continuous EventSource stream, and renders individual events in the SSE wire format.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demo SSE server
    Serve {
        /// Address to bind to
        #[arg(long, env = "SSE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "SSE_PORT")]
        port: Option<u16>,

        /// Ticks per connection before the stream closes
        #[arg(long)]
        page_size: Option<u64>,

        /// Milliseconds between ticks
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Print the SSE wire form of one event
    Frame {
        /// JSON payload for the data line
        #[arg(value_name = "JSON", required_unless_present = "error")]
        data: Option<String>,

        /// Event ID
        #[arg(long)]
        id: Option<String>,

        /// Event type
        #[arg(short, long)]
        event: Option<String>,

        /// Reconnect hint in milliseconds
        #[arg(short, long, default_value_t = 0)]
        retry: u64,

        /// Render an error event with this message instead of a payload
        #[arg(long, conflicts_with = "data")]
        error: Option<String>,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
