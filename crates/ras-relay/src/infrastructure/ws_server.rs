//! WebSocket server: accept loop and per-connection session management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from browsers.
//! 3. Upgrading each connection to a WebSocket on the configured path, and
//!    answering any other path with `404 Not Found`.
//! 4. Starting a [`Session`] over the upgraded stream and running the
//!    [`Processor`] on its boundary.
//! 5. Gracefully stopping the accept loop when the `running` flag is cleared.
//!
//! Each connection runs in its own Tokio task, and each session adds two more
//! for its pumps, so one slow client never holds up another.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, error, info, warn};

use crate::application::{Processor, Session};
use crate::domain::RelayConfig;
use crate::infrastructure::transport::WsTransport;

/// How often the accept loop wakes up to check the `running` flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves connections until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(
    config: RelayConfig,
    processor: Arc<dyn Processor>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!(
        "RAS relay listening on ws://{}{}",
        config.bind_addr, config.ws_path
    );

    serve(listener, config, processor, running).await
}

/// Runs the accept loop on an already bound listener.
///
/// Every accepted connection is handed to a dedicated task; the loop itself
/// never waits on a session.  Sessions already running are left to finish on
/// their own when the loop stops.
pub async fn serve(
    listener: TcpListener,
    config: RelayConfig,
    processor: Arc<dyn Processor>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let config = Arc::new(config);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the flag is re-checked even when nobody connects.
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new TCP connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let proc = Arc::clone(&processor);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, cfg, proc).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g., too many open file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    processor: Arc<dyn Processor>,
) {
    if let Err(e) = run_connection(stream, peer_addr, config, processor).await {
        warn!("connection {peer_addr} ended with error: {e:#}");
    }
}

/// Upgrades the connection, runs one session over it, and waits for both
/// pumps to finish.
async fn run_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    processor: Arc<dyn Processor>,
) -> anyhow::Result<()> {
    let ws_path = config.ws_path.clone();
    let ws_stream = accept_hdr_async(stream, move |req: &Request, resp: Response| {
        check_path(&ws_path, req, resp)
    })
    .await
    .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (reader, writer) = WsTransport::split(ws_stream);
    let (boundary, tasks) = Session::start(reader, writer, &config.session);
    let id = tasks.id();
    info!("session {id}: established with {peer_addr}");

    // Returning drops the boundary, which closes the send queue either way.
    if let Err(e) = processor.serve(boundary).await {
        warn!("session {id}: processor ended with error: {e}");
    }

    tasks.join().await;
    info!("session {id}: closed");
    Ok(())
}

/// Handshake callback: accepts the upgrade only on `expected`.
fn check_path(expected: &str, req: &Request, resp: Response) -> Result<Response, ErrorResponse> {
    let path = req.uri().path();
    if path == expected {
        return Ok(resp);
    }
    debug!("rejecting WebSocket upgrade for unknown path {path}");
    let mut rejection = ErrorResponse::new(Some(format!("no RAS endpoint at {path}")));
    *rejection.status_mut() = StatusCode::NOT_FOUND;
    Err(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{MockProcessor, ProcessorError};
    use futures_util::StreamExt;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_check_path_accepts_configured_path() {
        let result = check_path("/conn", &request("/conn"), Response::new(()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_check_path_ignores_query_string() {
        let result = check_path("/conn", &request("/conn?token=abc"), Response::new(()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_check_path_rejects_other_paths_with_404() {
        let err = check_path("/conn", &request("/static/app.js"), Response::new(())).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.body().as_deref().unwrap_or_default().contains("/static/app.js"));
    }

    #[tokio::test]
    async fn test_serve_returns_when_running_flag_cleared() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let running = Arc::new(AtomicBool::new(false));

        // Act
        let result = timeout(
            Duration::from_secs(2),
            serve(
                listener,
                RelayConfig::default(),
                Arc::new(crate::application::EchoProcessor),
                running,
            ),
        )
        .await;

        // Assert
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_server_reports_bind_failure() {
        // Arrange: occupy a port, then try to bind it again
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = RelayConfig {
            bind_addr: taken.local_addr().unwrap(),
            ..RelayConfig::default()
        };

        // Act
        let result = run_server(
            config,
            Arc::new(crate::application::EchoProcessor),
            Arc::new(AtomicBool::new(true)),
        )
        .await;

        // Assert
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("failed to bind"));
    }

    #[tokio::test]
    async fn test_failing_processor_still_closes_the_connection() {
        // Arrange: a processor that gives up straight away
        let mut processor = MockProcessor::new();
        processor
            .expect_serve()
            .times(1)
            .returning(|_| Err(ProcessorError::Handshake("no protocol".to_string())));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let server = tokio::spawn(serve(
            listener,
            RelayConfig::default(),
            Arc::new(processor),
            Arc::clone(&running),
        ));

        // Act
        let (mut ws, _) = connect_async(format!("ws://{addr}/conn")).await.unwrap();
        let first = timeout(Duration::from_secs(5), ws.next()).await.unwrap();

        // Assert: the relay sends its close frame
        assert!(matches!(first, Some(Ok(WsMessage::Close(None)))));

        running.store(false, Ordering::Relaxed);
        server.await.unwrap().unwrap();
    }
}
