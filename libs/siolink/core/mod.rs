//! Session engine: handshake, dispatch, heartbeat, and the client itself.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod handshake;
pub mod heartbeat;
pub mod registry;
pub mod session_state;

// Re-export main types
pub use client::SocketIoClient;
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, Effect};
pub use handshake::HandshakeInfo;
pub use registry::{NamespaceRegistry, Teardown, ROOT_NAMESPACE};
pub use session_state::{AtomicMetrics, AtomicSessionState, Metrics, SessionState};
