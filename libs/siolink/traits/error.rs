use thiserror::Error;

/// Main error type for siolink
#[derive(Error, Debug)]
pub enum SioError {
    /// HTTP-level failure during handshake negotiation
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Handshake body was not in the supported JSON format (legacy protocol)
    #[error("unsupported handshake protocol: {0}")]
    UnsupportedProtocol(String),

    /// Malformed inbound frame; carries the offending raw text
    #[error("frame decode failed ({reason}): {raw:?}")]
    FrameDecode { raw: String, reason: String },

    /// Frame kind the client does not implement (binary event/ack)
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),

    /// Error reported by the streaming transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Send attempted while the session is not connected
    #[error("not connected: {0}")]
    NotConnected(String),

    /// Operation not valid in the current session state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Channel send error
    #[error("channel send error: {0}")]
    ChannelSend(String),
}

/// Result type for siolink operations
pub type Result<T> = std::result::Result<T, SioError>;
