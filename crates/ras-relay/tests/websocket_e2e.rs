//! End-to-end: a real WebSocket client talking to the relay over loopback.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ras_core::protocol::ProtocolMessage;
use ras_core::{decode_message, encode_message, Message, Role};
use ras_relay::application::EchoProcessor;
use ras_relay::domain::RelayConfig;
use ras_relay::infrastructure::serve;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

const LIMIT: Duration = Duration::from_secs(5);

struct Relay {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Relay {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(serve(
            listener,
            RelayConfig::default(),
            Arc::new(EchoProcessor),
            Arc::clone(&running),
        ));
        Self {
            addr,
            running,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    async fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        let result = timeout(LIMIT, self.task).await.expect("accept loop stops");
        assert!(result.unwrap().is_ok());
    }
}

fn client_frame(msg: &Message) -> WsMessage {
    WsMessage::Binary(encode_message(Role::Client, msg).unwrap())
}

#[tokio::test]
async fn test_text_message_round_trips_through_echo_processor() {
    // Arrange
    let relay = Relay::start().await;
    let (mut ws, _) = connect_async(relay.url("/conn")).await.unwrap();

    // Act
    ws.send(client_frame(&Message::Protocol(ProtocolMessage {
        protocol: "vnc".into(),
    })))
    .await
    .unwrap();
    ws.send(client_frame(&Message::Text("hi".into()))).await.unwrap();
    let reply = timeout(LIMIT, ws.next()).await.unwrap().unwrap().unwrap();

    // Assert
    let WsMessage::Binary(bytes) = reply else {
        panic!("expected a binary frame, got {reply:?}");
    };
    assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i']);
    assert_eq!(
        decode_message(Role::Client, &bytes).unwrap(),
        Message::Text("hi".into())
    );

    ws.close(None).await.unwrap();
    relay.stop().await;
}

#[tokio::test]
async fn test_text_frame_makes_relay_close_the_connection() {
    // Arrange
    let relay = Relay::start().await;
    let (mut ws, _) = connect_async(relay.url("/conn")).await.unwrap();

    // Act
    ws.send(WsMessage::Text("not allowed".into())).await.unwrap();

    // Assert: the relay answers with a close frame (or simply goes away)
    let closed = timeout(LIMIT, async {
        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    relay.stop().await;
}

#[tokio::test]
async fn test_upgrade_on_other_path_is_rejected_with_404() {
    let relay = Relay::start().await;

    let result = connect_async(relay.url("/elsewhere")).await;

    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 404),
        Err(e) => panic!("expected an HTTP 404 rejection, got {e}"),
        Ok(_) => panic!("upgrade on an unknown path was accepted"),
    }
    relay.stop().await;
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let relay = Relay::start().await;
    let (mut a, _) = connect_async(relay.url("/conn")).await.unwrap();
    let (mut b, _) = connect_async(relay.url("/conn")).await.unwrap();

    a.send(client_frame(&Message::Binary(vec![0xaa]))).await.unwrap();
    b.send(client_frame(&Message::Binary(vec![0xbb]))).await.unwrap();

    let from_b = timeout(LIMIT, b.next()).await.unwrap().unwrap().unwrap();
    let from_a = timeout(LIMIT, a.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(from_a, client_frame(&Message::Binary(vec![0xaa])));
    assert_eq!(from_b, client_frame(&Message::Binary(vec![0xbb])));

    a.close(None).await.unwrap();
    b.close(None).await.unwrap();
    relay.stop().await;
}
