//! RAS relay: entry point.
//!
//! Accepts WebSocket connections from browser clients on a single path
//! (`/conn` by default), starts a session per connection, and runs the bundled
//! [`EchoProcessor`] against it.
//!
//! # Usage
//!
//! ```text
//! ras-relay [OPTIONS]
//!
//! Options:
//!   --config <FILE>              TOML config file
//!   --bind <IP>                  Listener IP address [default: 127.0.0.1]
//!   --port <PORT>                Listener port [default: 8080]
//!   --ws-path <PATH>             WebSocket upgrade path [default: /conn]
//!   --queue-capacity <N>         Per-session queue capacity [default: 32]
//!   --close-deadline-ms <MS>     Close frame deadline [default: 1000]
//! ```
//!
//! # Precedence
//!
//! Built-in defaults, then the config file, then environment variables, then
//! command-line flags.
//!
//! | Variable                 | Flag                  |
//! |--------------------------|-----------------------|
//! | `RAS_CONFIG`             | `--config`            |
//! | `RAS_BIND`               | `--bind`              |
//! | `RAS_PORT`               | `--port`              |
//! | `RAS_WS_PATH`            | `--ws-path`           |
//! | `RAS_QUEUE_CAPACITY`     | `--queue-capacity`    |
//! | `RAS_CLOSE_DEADLINE_MS`  | `--close-deadline-ms` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ras_relay::application::EchoProcessor;
use ras_relay::domain::RelayConfig;
use ras_relay::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket relay for RAS remote-desktop clients.
#[derive(Debug, Parser)]
#[command(
    name = "ras-relay",
    about = "WebSocket relay between RAS browser clients and a message processor",
    version
)]
struct Cli {
    /// Path to a TOML config file.  Values given on the command line win.
    #[arg(long, env = "RAS_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind the WebSocket listener to.
    #[arg(long, env = "RAS_BIND")]
    bind: Option<String>,

    /// TCP port for the WebSocket listener.
    #[arg(long, env = "RAS_PORT")]
    port: Option<u16>,

    /// HTTP path that accepts WebSocket upgrades.
    #[arg(long, env = "RAS_WS_PATH")]
    ws_path: Option<String>,

    /// Capacity of each per-session message queue.
    #[arg(long, env = "RAS_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,

    /// How long to wait for the close frame to go out, in milliseconds.
    #[arg(long, env = "RAS_CLOSE_DEADLINE_MS")]
    close_deadline_ms: Option<u64>,
}

impl Cli {
    /// Builds the effective [`RelayConfig`]: file (or defaults), then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded, `--bind` is not
    /// an IP address, or the merged configuration fails validation.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = &self.bind {
            let ip: IpAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address: '{bind}'"))?;
            config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(ws_path) = self.ws_path {
            config.ws_path = ws_path;
        }
        if let Some(capacity) = self.queue_capacity {
            config.session.queue_capacity = capacity;
        }
        if let Some(ms) = self.close_deadline_ms {
            config.session.close_deadline_ms = ms;
        }

        config.validate().context("invalid relay configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; fall back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_relay_config()?;

    info!(
        "RAS relay starting: bind={}, path={}, queue_capacity={}, close_deadline={:?}",
        config.bind_addr,
        config.ws_path,
        config.session.queue_capacity,
        config.session.close_deadline()
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    // The accept loop checks this flag every 200 ms and exits cleanly.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, Arc::new(EchoProcessor), running).await?;

    info!("RAS relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
