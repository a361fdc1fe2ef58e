//! Transport adapters implementing the application's frame ports.
//!
//! - [`websocket`]: tokio-tungstenite WebSocket streams (production)
//! - [`mock`]: channel-backed transport for tests
//!
//! Both adapters split a transport into a reader and a writer that share a
//! `tokio::sync::watch` close signal.  The writer owns the sender; closing it,
//! or dropping it, wakes any read in progress with `TransportError::Closed`.

pub mod mock;
pub mod websocket;

pub use websocket::{WsFrameReader, WsFrameWriter, WsTransport};

use tokio::sync::watch;

/// Resolves once the close signal is raised or its sender is gone.
pub(crate) async fn closed_signal(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
