use std::collections::HashMap;

/// HTTP headers attached to the handshake request.
///
/// Headers are caller-supplied and forwarded verbatim to the polling
/// endpoint during negotiation. Typical uses are session cookies or
/// authorization tokens the server expects before it will allocate a
/// session id.
pub type Headers = HashMap<String, String>;
