//! Client configuration and endpoint URL construction.

/// Configuration for a [`SocketIoClient`](crate::SocketIoClient).
///
/// `base_address` is the bare `host[:port]` of the server; scheme selection
/// (http/https, ws/wss) is driven by the `secure` flag.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_address: String,
    secure: bool,
}

impl ClientConfig {
    pub fn new(base_address: impl Into<String>, secure: bool) -> Self {
        Self {
            base_address: base_address.into(),
            secure,
        }
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Endpoint for the handshake negotiation request.
    pub fn polling_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!(
            "{}://{}/socket.io/1/?EIO=2&transport=polling&b64=true",
            scheme, self.base_address
        )
    }

    /// Endpoint for the streaming transport, once the session id is known.
    pub fn websocket_url(&self, sid: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!(
            "{}://{}/socket.io/1/websocket/?EIO=2&transport=websocket&sid={}",
            scheme, self.base_address, sid
        )
    }
}
