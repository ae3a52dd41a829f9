//! The session aggregate: public API plus the connection task.
//!
//! One `SocketIoClient` owns at most one physical connection. The
//! connection task is the only writer on the WebSocket sink, so the send
//! path is serialized by construction: application sends arrive over the
//! command channel, heartbeat pings over their own channel, and protocol
//! replies are produced inline by the dispatcher.

use crate::codec::frame::Frame;
use crate::core::config::ClientConfig;
use crate::core::dispatcher::{Dispatcher, Effect};
use crate::core::handshake::{self, HandshakeInfo};
use crate::core::heartbeat;
use crate::core::registry::{NamespaceRegistry, Teardown, ROOT_NAMESPACE};
use crate::core::session_state::{AtomicMetrics, AtomicSessionState, Metrics, SessionState};
use crate::traits::{Headers, NamespaceSubscriber, Result, SioError};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// Internal command messages for the connection task.
#[derive(Debug)]
enum SessionCommand {
    /// Write a frame to the transport.
    Send(Frame),
    /// Send a root DISCONNECT, then close the transport.
    Disconnect,
}

struct Connection {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    task_handle: tokio::task::JoinHandle<()>,
}

/// Socket.IO client session.
///
/// Reusable across connections: after `disconnect()` completes (or the
/// server closes the transport) the client is back in `Disconnected` and
/// `connect()` may be called again.
pub struct SocketIoClient {
    config: ClientConfig,
    state: Arc<AtomicSessionState>,
    metrics: Arc<AtomicMetrics>,
    registry: Arc<NamespaceRegistry>,
    session: Arc<RwLock<Option<HandshakeInfo>>>,
    connection: tokio::sync::Mutex<Option<Connection>>,
}

impl SocketIoClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicSessionState::default()),
            metrics: Arc::new(AtomicMetrics::new()),
            registry: Arc::new(NamespaceRegistry::new()),
            session: Arc::new(RwLock::new(None)),
            connection: tokio::sync::Mutex::new(None),
        }
    }

    /// Current session lifecycle state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Session id assigned by the server at handshake, if negotiated.
    pub fn session_id(&self) -> Option<String> {
        self.session.read().as_ref().map(|info| info.sid.clone())
    }

    /// Server-announced heartbeat interval in seconds, if negotiated.
    pub fn heartbeat_interval(&self) -> Option<u64> {
        self.session.read().as_ref().map(|info| info.heartbeat_interval)
    }

    /// Server-side session timeout in seconds, if negotiated.
    pub fn timeout(&self) -> Option<u64> {
        self.session.read().as_ref().map(|info| info.timeout)
    }

    /// Frame counters and state snapshot.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            frames_sent: self.metrics.frames_sent(),
            frames_received: self.metrics.frames_received(),
            state: self.state.get(),
        }
    }

    /// Register a subscriber for a namespace, overwriting any existing one.
    ///
    /// The client keeps only a weak handle; the caller owns the subscriber.
    pub fn register_subscriber(
        &self,
        namespace: impl Into<String>,
        subscriber: &Arc<dyn NamespaceSubscriber>,
    ) {
        self.registry.register(namespace, subscriber);
    }

    /// Negotiate a session and upgrade to the streaming transport.
    ///
    /// Returns once the transport is open and the upgrade has been
    /// acknowledged; the heartbeat is running by then. Not cancellable: a
    /// caller wanting a connect deadline must impose it externally.
    pub async fn connect(&self, headers: &Headers) -> Result<()> {
        let mut connection = self.connection.lock().await;
        // A server-initiated close ends the connection task but leaves its
        // finished handle in the slot; reap it so the session is reusable.
        if connection
            .as_ref()
            .map(|c| c.task_handle.is_finished())
            .unwrap_or(false)
        {
            if let Some(stale) = connection.take() {
                let _ = stale.task_handle.await;
            }
        }
        if connection.is_some() || !self.state.is_disconnected() {
            return Err(SioError::InvalidState(format!(
                "connect called while {:?}",
                self.state.get()
            )));
        }

        self.state.set(SessionState::Negotiating);
        let info = match handshake::negotiate(&self.config, headers).await {
            Ok(info) => info,
            Err(e) => {
                self.state.set(SessionState::Disconnected);
                return Err(e);
            }
        };
        info!(
            sid = %info.sid,
            heartbeat = info.heartbeat_interval,
            timeout = info.timeout,
            "handshake complete"
        );

        self.state.set(SessionState::Upgrading);
        let url = self.config.websocket_url(&info.sid);
        debug!(%url, "opening websocket");
        let (ws_stream, _) = match connect_async(&url).await {
            Ok(ok) => ok,
            Err(e) => {
                self.state.set(SessionState::Disconnected);
                return Err(SioError::Transport(e.to_string()));
            }
        };
        let (mut write, read) = ws_stream.split();

        // Engine.IO upgrade acknowledgement. Connected, and with it the
        // heartbeat, only exists once this frame is on the wire.
        if let Err(e) = write.send(Message::Text(Frame::upgrade_ack().encode())).await {
            self.state.set(SessionState::Disconnected);
            return Err(SioError::Transport(e.to_string()));
        }
        self.metrics.increment_sent();
        // Session parameters are visible by the time the state reads
        // Connected, and stay visible until the connection task exits.
        let interval = heartbeat::heartbeat_interval(info.heartbeat_interval);
        *self.session.write() = Some(info);
        self.state.set(SessionState::Connected);
        info!("socket connected");

        let (heartbeat_handle, heartbeat_stop, heartbeat_rx) = heartbeat::spawn_heartbeat(interval);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task_handle = tokio::spawn(run_connection(
            write,
            read,
            Arc::clone(&self.state),
            Arc::clone(&self.metrics),
            Arc::clone(&self.registry),
            Arc::clone(&self.session),
            command_rx,
            heartbeat_rx,
            heartbeat_handle,
            heartbeat_stop,
        ));
        *connection = Some(Connection {
            command_tx,
            task_handle,
        });
        Ok(())
    }

    /// Disconnect the session: root DISCONNECT frame, transport close, and
    /// a deterministic wait for the heartbeat to stop.
    ///
    /// A no-op on an already-disconnected session.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(connection) = self.connection.lock().await.take() else {
            debug!("disconnect on a disconnected session is a no-op");
            return Ok(());
        };
        if !self.state.is_disconnected() {
            let _ = connection.command_tx.send(SessionCommand::Disconnect);
        }
        // The connection task joins the heartbeat before it exits, so this
        // await observes full teardown.
        connection
            .task_handle
            .await
            .map_err(|e| SioError::Transport(e.to_string()))
    }

    /// Announce interest in a namespace with a CONNECT frame.
    pub async fn connect_namespace(&self, namespace: &str) -> Result<()> {
        debug!(namespace, "connecting namespace");
        self.send_frame(Frame::connect(namespace)).await
    }

    /// Drop a namespace registration.
    ///
    /// Removing the root or the last namespace tears the whole session
    /// down; otherwise only a scoped DISCONNECT frame is sent.
    pub async fn disconnect_namespace(&self, namespace: &str) -> Result<()> {
        match self.registry.unregister(namespace) {
            Teardown::Full => {
                info!(namespace, "last namespace removed, disconnecting session");
                self.disconnect().await
            }
            Teardown::Scoped => {
                debug!(namespace, "disconnecting namespace");
                self.send_frame(Frame::disconnect(namespace)).await
            }
        }
    }

    /// Send `text` as a `"message"` event on a namespace.
    pub async fn send(&self, namespace: &str, text: &str) -> Result<()> {
        self.emit(namespace, "message", text).await
    }

    /// Emit an event with a raw JSON argument payload on a namespace.
    pub async fn emit(&self, namespace: &str, event: &str, args: &str) -> Result<()> {
        debug!(namespace, event, "emit");
        self.send_frame(Frame::event(namespace, event, args)).await
    }

    async fn send_frame(&self, frame: Frame) -> Result<()> {
        let connection = self.connection.lock().await;
        let Some(connection) = connection.as_ref() else {
            warn!(frame = %frame.encode(), "send failed: session is disconnected");
            return Err(SioError::NotConnected("session is disconnected".into()));
        };
        if !self.state.is_connected() {
            warn!(state = ?self.state.get(), "send failed: transport not connected");
            return Err(SioError::NotConnected(format!(
                "session state is {:?}",
                self.state.get()
            )));
        }
        connection
            .command_tx
            .send(SessionCommand::Send(frame))
            .map_err(|e| SioError::ChannelSend(e.to_string()))
    }
}

/// Encode and write one frame on the single outbound path.
async fn write_frame(write: &mut WsWrite, metrics: &AtomicMetrics, frame: &Frame) -> Result<()> {
    let text = frame.encode();
    debug!(%text, "sending frame");
    write
        .send(Message::Text(text))
        .await
        .map_err(|e| SioError::Transport(e.to_string()))?;
    metrics.increment_sent();
    Ok(())
}

/// Connection task: sole owner of the WebSocket, select-driven.
#[allow(clippy::too_many_arguments)]
async fn run_connection(
    mut write: WsWrite,
    mut read: WsRead,
    state: Arc<AtomicSessionState>,
    metrics: Arc<AtomicMetrics>,
    registry: Arc<NamespaceRegistry>,
    session: Arc<RwLock<Option<HandshakeInfo>>>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    mut heartbeat_rx: mpsc::UnboundedReceiver<Frame>,
    heartbeat_handle: tokio::task::JoinHandle<()>,
    heartbeat_stop: oneshot::Sender<()>,
) {
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.increment_received();
                        match dispatcher.dispatch(&text) {
                            Ok(Effect::None) => {}
                            Ok(Effect::Reply(frame)) => {
                                if write_frame(&mut write, &metrics, &frame).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Effect::ScopedDisconnect(namespace)) => {
                                if write_frame(&mut write, &metrics, &Frame::disconnect(&namespace)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Effect::FullDisconnect) => {
                                info!("server disconnected the session");
                                state.set(SessionState::Closing);
                                let _ = write_frame(&mut write, &metrics, &Frame::disconnect(ROOT_NAMESPACE)).await;
                                break;
                            }
                            // Malformed or unsupported frames are dropped; the session stays up.
                            Err(e) => warn!(error = %e, "dropping inbound frame"),
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!("dropping binary transport message, not supported");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("server closed the connection");
                        break;
                    }
                    // Transport-level ping/pong is handled by tungstenite.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "transport error");
                        break;
                    }
                    None => {
                        warn!("websocket stream ended");
                        break;
                    }
                }
            }

            cmd = command_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Send(frame)) => {
                        if write_frame(&mut write, &metrics, &frame).await.is_err() {
                            break;
                        }
                    }
                    Some(SessionCommand::Disconnect) => {
                        info!("disconnect requested");
                        state.set(SessionState::Closing);
                        let _ = write_frame(&mut write, &metrics, &Frame::disconnect(ROOT_NAMESPACE)).await;
                        break;
                    }
                    None => {
                        debug!("command channel closed");
                        break;
                    }
                }
            }

            frame = heartbeat_rx.recv() => {
                match frame {
                    Some(frame) => {
                        debug!("sending heartbeat ping");
                        if write_frame(&mut write, &metrics, &frame).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        warn!("heartbeat channel closed unexpectedly");
                        break;
                    }
                }
            }
        }
    }

    // Teardown ordering is load-bearing: mark disconnected, notify the
    // subscribers, then stop the heartbeat and wait for it to fully exit.
    // The join runs on this task, never on the heartbeat's own context.
    let _ = write.close().await;
    state.set(SessionState::Disconnected);
    *session.write() = None;
    registry.notify_closed();
    let _ = heartbeat_stop.send(());
    if let Err(e) = heartbeat_handle.await {
        warn!(error = %e, "heartbeat task join failed");
    }
    debug!("connection task exiting");
}
