//! Common test utilities for siolink integration tests.
//!
//! `MockSioServer` serves both halves of the protocol on one port: plain
//! HTTP for the polling handshake and a WebSocket endpoint for the
//! upgraded transport, distinguished by peeking at the request line.

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use siolink::NamespaceSubscriber;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Handshake body matching the documented server response shape.
pub fn default_handshake_body() -> String {
    r#"{"sid":"abc123","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":60000}"#
        .to_string()
}

/// Instruction for the mock's websocket connection loop.
enum ServerAction {
    Text(String),
    Close,
}

pub struct MockSioServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    outbound_tx: mpsc::UnboundedSender<ServerAction>,
    ws_connections: Arc<AtomicUsize>,
    client_closed: Arc<AtomicBool>,
    handshake_request: Arc<Mutex<Option<String>>>,
}

impl MockSioServer {
    /// Start a server answering the polling handshake with `handshake_body`.
    pub async fn start(handshake_body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handshake_body = handshake_body.into();

        let received = Arc::new(Mutex::new(Vec::new()));
        let ws_connections = Arc::new(AtomicUsize::new(0));
        let client_closed = Arc::new(AtomicBool::new(false));
        let handshake_request = Arc::new(Mutex::new(None));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let outbound_slot = Arc::new(tokio::sync::Mutex::new(Some(outbound_rx)));

        {
            let received = Arc::clone(&received);
            let ws_connections = Arc::clone(&ws_connections);
            let client_closed = Arc::clone(&client_closed);
            let handshake_request = Arc::clone(&handshake_request);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let handshake_body = handshake_body.clone();
                    let received = Arc::clone(&received);
                    let ws_connections = Arc::clone(&ws_connections);
                    let client_closed = Arc::clone(&client_closed);
                    let handshake_request = Arc::clone(&handshake_request);
                    let outbound_slot = Arc::clone(&outbound_slot);
                    tokio::spawn(async move {
                        handle_connection(
                            stream,
                            handshake_body,
                            received,
                            ws_connections,
                            client_closed,
                            handshake_request,
                            outbound_slot,
                        )
                        .await;
                    });
                }
            });
        }

        Self {
            addr,
            received,
            outbound_tx,
            ws_connections,
            client_closed,
            handshake_request,
        }
    }

    /// Queue a text frame for the websocket connection to deliver.
    pub fn send_text(&self, text: impl Into<String>) {
        self.outbound_tx.send(ServerAction::Text(text.into())).unwrap();
    }

    /// Drop the websocket connection after any queued frames are delivered.
    pub fn close_transport(&self) {
        self.outbound_tx.send(ServerAction::Close).unwrap();
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn ws_connections(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn client_closed(&self) -> bool {
        self.client_closed.load(Ordering::SeqCst)
    }

    /// The raw request head of the polling handshake, if one was served.
    pub fn handshake_request(&self) -> Option<String> {
        self.handshake_request.lock().clone()
    }

    /// Wait until the websocket has received `frame`, panicking on timeout.
    pub async fn wait_for_frame(&self, frame: &str) {
        self.wait_until(|received| received.iter().any(|f| f == frame))
            .await
            .unwrap_or_else(|| {
                panic!("frame {frame:?} not received, got {:?}", self.received())
            });
    }

    /// Poll `predicate` against the received frames for up to five seconds.
    pub async fn wait_until(&self, predicate: impl Fn(&[String]) -> bool) -> Option<()> {
        for _ in 0..500 {
            if predicate(&self.received.lock()) {
                return Some(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    handshake_body: String,
    received: Arc<Mutex<Vec<String>>>,
    ws_connections: Arc<AtomicUsize>,
    client_closed: Arc<AtomicBool>,
    handshake_request: Arc<Mutex<Option<String>>>,
    outbound_slot: Arc<tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<ServerAction>>>>,
) {
    // Peek the request line to tell the polling handshake from the upgrade.
    let mut peek_buf = [0u8; 512];
    let Ok(n) = stream.peek(&mut peek_buf).await else {
        return;
    };
    let head = String::from_utf8_lossy(&peek_buf[..n]).to_string();

    if head.contains("transport=polling") {
        // Drain the request head, then answer with the canned body.
        let mut request = vec![0u8; 2048];
        let n = stream.read(&mut request).await.unwrap_or(0);
        *handshake_request.lock() = Some(String::from_utf8_lossy(&request[..n]).to_string());
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            handshake_body.len(),
            handshake_body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        return;
    }

    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    ws_connections.fetch_add(1, Ordering::SeqCst);
    let (mut write, mut read) = ws.split();
    let mut outbound = outbound_slot.lock().await.take();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => received.lock().push(text),
                    Some(Ok(Message::Close(_))) | None => {
                        client_closed.store(true, Ordering::SeqCst);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            out = recv_outbound(&mut outbound) => {
                match out {
                    Some(ServerAction::Text(text)) => {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(ServerAction::Close) => break,
                    None => outbound = None,
                }
            }
        }
    }
}

async fn recv_outbound(
    outbound: &mut Option<mpsc::UnboundedReceiver<ServerAction>>,
) -> Option<ServerAction> {
    match outbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Bare HTTP responder for handshake failure scenarios; serves every
/// request with the same status line and body, no websocket support.
pub async fn spawn_http_responder(status_line: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = vec![0u8; 2048];
            let _ = stream.read(&mut request).await;
            let response = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    addr
}

/// Subscriber that records every callback for later assertions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Callback {
    Connect(String),
    DisconnectRequested,
    Event(String, String),
    Error(String),
    SocketClosed,
}

#[derive(Default)]
pub struct RecordingSubscriber {
    calls: Mutex<Vec<Callback>>,
}

impl RecordingSubscriber {
    pub fn calls(&self) -> Vec<Callback> {
        self.calls.lock().clone()
    }

    pub async fn wait_for(&self, callback: &Callback) {
        for _ in 0..500 {
            if self.calls.lock().contains(callback) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("callback {callback:?} not observed, got {:?}", self.calls());
    }
}

impl NamespaceSubscriber for RecordingSubscriber {
    fn on_connect(&self, body: &str) {
        self.calls.lock().push(Callback::Connect(body.to_string()));
    }

    fn on_disconnect_requested(&self) {
        self.calls.lock().push(Callback::DisconnectRequested);
    }

    fn on_event(&self, event: &str, body: &str) {
        self.calls
            .lock()
            .push(Callback::Event(event.to_string(), body.to_string()));
    }

    fn on_error(&self, body: &str) {
        self.calls.lock().push(Callback::Error(body.to_string()));
    }

    fn on_socket_closed(&self) {
        self.calls.lock().push(Callback::SocketClosed);
    }
}
