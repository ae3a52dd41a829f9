//! Handshake negotiation over HTTP polling.
//!
//! One GET against the polling endpoint yields the session id and the
//! server's heartbeat timing. The response body is a JSON object, possibly
//! preceded by an Engine.IO polling length prefix; anything that does not
//! end in a JSON object is the legacy pre-JSON protocol and is rejected
//! loudly rather than degraded.

use crate::core::config::ClientConfig;
use crate::traits::{Headers, Result, SioError};
use serde::Deserialize;
use tracing::debug;

/// Session parameters returned by a successful handshake.
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    /// Opaque session id assigned by the server.
    pub sid: String,
    /// Client heartbeat interval, seconds.
    pub heartbeat_interval: u64,
    /// Server-side session timeout, seconds.
    pub timeout: u64,
}

// `upgrades` is also present in the body; it is ignored, which serde does
// for free by not declaring the field.
#[derive(Deserialize)]
struct HandshakeBody {
    sid: String,
    #[serde(rename = "pingInterval")]
    ping_interval: u64,
    #[serde(rename = "pingTimeout")]
    ping_timeout: u64,
}

/// Perform the handshake request and parse the session parameters.
pub async fn negotiate(config: &ClientConfig, headers: &Headers) -> Result<HandshakeInfo> {
    let url = config.polling_url();
    debug!(%url, "starting handshake");

    let client = reqwest::Client::new();
    let mut request = client.get(&url);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request
        .send()
        .await
        .map_err(|e| SioError::Handshake(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(SioError::Handshake(format!("server returned {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SioError::Handshake(e.to_string()))?;
    debug!(%body, "handshake response");

    parse_handshake(&body)
}

/// Parse a handshake response body into [`HandshakeInfo`].
///
/// Millisecond timing fields are converted to whole seconds, matching the
/// unit the server documents.
pub fn parse_handshake(body: &str) -> Result<HandshakeInfo> {
    let trimmed = body.trim_end();
    if !trimmed.ends_with('}') {
        return Err(SioError::UnsupportedProtocol(format!(
            "handshake body is not a JSON object (legacy 0.9.x server?): {body:?}"
        )));
    }
    let start = trimmed
        .find('{')
        .ok_or_else(|| SioError::UnsupportedProtocol(format!("no JSON object in handshake body: {body:?}")))?;

    let parsed: HandshakeBody = serde_json::from_str(&trimmed[start..])
        .map_err(|e| SioError::UnsupportedProtocol(format!("malformed handshake JSON: {e}")))?;

    Ok(HandshakeInfo {
        sid: parsed.sid,
        heartbeat_interval: parsed.ping_interval / 1000,
        timeout: parsed.ping_timeout / 1000,
    })
}
