//! # siolink
//!
//! A Socket.IO 1.x / Engine.IO 2 client built on tokio and tokio-tungstenite.
//!
//! The client negotiates a session id over HTTP polling, upgrades to a
//! persistent WebSocket, and multiplexes any number of logical namespaces
//! over that single connection while a background task keeps the session
//! alive with periodic pings.
//!
//! ## Features
//!
//! - **Two-level frame codec**: Engine.IO control codes with Socket.IO
//!   message codes, namespaces, and JSON event payloads layered inside
//! - **Namespace multiplexing**: per-namespace subscriber callbacks routed
//!   from a single inbound dispatcher
//! - **Heartbeat lifecycle**: a dedicated tokio task with cooperative,
//!   joinable shutdown so teardown never races a late ping
//! - **Single-writer send path**: every outbound frame is serialized through
//!   the connection task that owns the WebSocket sink
//!
//! ## Example
//!
//! ```rust,ignore
//! use siolink::{ClientConfig, Headers, SocketIoClient};
//!
//! #[tokio::main]
//! async fn main() -> siolink::Result<()> {
//!     let client = SocketIoClient::new(ClientConfig::new("chat.example.com:3000", false));
//!
//!     let chat: std::sync::Arc<dyn siolink::NamespaceSubscriber> =
//!         std::sync::Arc::new(ChatSubscriber::default());
//!     client.register_subscriber("/chat", &chat);
//!
//!     client.connect(&Headers::new()).await?;
//!     client.connect_namespace("/chat").await?;
//!     client.emit("/chat", "msg", "\"hello\"").await?;
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use codec::frame::{EngineCode, Frame, FrameBody, MessageCode};
pub use crate::core::{
    client::SocketIoClient,
    config::ClientConfig,
    dispatcher::{Dispatcher, Effect},
    handshake::HandshakeInfo,
    registry::{NamespaceRegistry, Teardown, ROOT_NAMESPACE},
    session_state::{AtomicMetrics, AtomicSessionState, Metrics, SessionState},
};
