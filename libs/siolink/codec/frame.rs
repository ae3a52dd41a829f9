//! Frame encoding and decoding.
//!
//! A frame is a single Engine.IO control digit, optionally followed (for
//! MESSAGE frames) by a Socket.IO message digit, an optional `/namespace,`
//! segment, and a body. Event bodies are JSON arrays whose first element is
//! the event name and whose remainder is the argument payload:
//!
//! ```text
//! 2probe                      engine PING, body "probe"
//! 40/chat,                    Socket.IO CONNECT for /chat
//! 42/chat,["msg","hi"]        event "msg" with argument "hi" on /chat
//! ```
//!
//! Decoding is total: malformed input degrades to [`SioError::FrameDecode`]
//! carrying the offending raw text, never a panic.

use crate::traits::{Result, SioError};

/// Engine.IO control codes (the outer framing level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCode {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
}

impl EngineCode {
    fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(EngineCode::Open),
            '1' => Some(EngineCode::Close),
            '2' => Some(EngineCode::Ping),
            '3' => Some(EngineCode::Pong),
            '4' => Some(EngineCode::Message),
            '5' => Some(EngineCode::Upgrade),
            '6' => Some(EngineCode::Noop),
            _ => None,
        }
    }

    fn digit(self) -> char {
        match self {
            EngineCode::Open => '0',
            EngineCode::Close => '1',
            EngineCode::Ping => '2',
            EngineCode::Pong => '3',
            EngineCode::Message => '4',
            EngineCode::Upgrade => '5',
            EngineCode::Noop => '6',
        }
    }
}

/// Socket.IO message codes (the inner level, inside MESSAGE frames).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    Connect,
    Disconnect,
    Event,
    Ack,
    Error,
    BinaryEvent,
    BinaryAck,
}

impl MessageCode {
    fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(MessageCode::Connect),
            '1' => Some(MessageCode::Disconnect),
            '2' => Some(MessageCode::Event),
            '3' => Some(MessageCode::Ack),
            '4' => Some(MessageCode::Error),
            '5' => Some(MessageCode::BinaryEvent),
            '6' => Some(MessageCode::BinaryAck),
            _ => None,
        }
    }

    fn digit(self) -> char {
        match self {
            MessageCode::Connect => '0',
            MessageCode::Disconnect => '1',
            MessageCode::Event => '2',
            MessageCode::Ack => '3',
            MessageCode::Error => '4',
            MessageCode::BinaryEvent => '5',
            MessageCode::BinaryAck => '6',
        }
    }
}

/// Payload carried by a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    /// No payload.
    None,
    /// Raw text payload.
    Text(String),
    /// Event name plus the raw JSON text of the single-argument payload.
    Event { name: String, args: String },
}

/// A single wire frame.
///
/// Fields are private so the invariant "only MESSAGE frames carry a message
/// code" holds by construction; use the constructors and accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    engine: EngineCode,
    message: Option<MessageCode>,
    namespace: Option<String>,
    body: FrameBody,
}

/// An absent or root namespace is stored as `None` and routes to `"/"`.
fn normalize_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() || namespace == "/" {
        None
    } else {
        Some(namespace.to_string())
    }
}

impl Frame {
    /// Engine.IO PING with no body.
    pub fn ping() -> Self {
        Frame {
            engine: EngineCode::Ping,
            message: None,
            namespace: None,
            body: FrameBody::None,
        }
    }

    /// Engine.IO PONG echoing `body`.
    pub fn pong(body: &str) -> Self {
        Frame {
            engine: EngineCode::Pong,
            message: None,
            namespace: None,
            body: if body.is_empty() {
                FrameBody::None
            } else {
                FrameBody::Text(body.to_string())
            },
        }
    }

    /// The literal `"5"` acknowledging the transport upgrade.
    pub fn upgrade_ack() -> Self {
        Frame {
            engine: EngineCode::Upgrade,
            message: None,
            namespace: None,
            body: FrameBody::None,
        }
    }

    /// Socket.IO CONNECT for `namespace`.
    pub fn connect(namespace: &str) -> Self {
        Frame {
            engine: EngineCode::Message,
            message: Some(MessageCode::Connect),
            namespace: normalize_namespace(namespace),
            body: FrameBody::None,
        }
    }

    /// Socket.IO DISCONNECT for `namespace`.
    pub fn disconnect(namespace: &str) -> Self {
        Frame {
            engine: EngineCode::Message,
            message: Some(MessageCode::Disconnect),
            namespace: normalize_namespace(namespace),
            body: FrameBody::None,
        }
    }

    /// Socket.IO EVENT carrying `args` as the raw argument payload.
    pub fn event(namespace: &str, name: &str, args: &str) -> Self {
        Frame {
            engine: EngineCode::Message,
            message: Some(MessageCode::Event),
            namespace: normalize_namespace(namespace),
            body: FrameBody::Event {
                name: name.to_string(),
                args: args.to_string(),
            },
        }
    }

    pub fn engine(&self) -> EngineCode {
        self.engine
    }

    pub fn message(&self) -> Option<MessageCode> {
        self.message
    }

    /// The namespace this frame routes to; absent means the root `"/"`.
    pub fn namespace_or_root(&self) -> &str {
        self.namespace.as_deref().unwrap_or("/")
    }

    pub fn body(&self) -> &FrameBody {
        &self.body
    }

    /// The raw text payload, or `""` when the frame has none.
    pub fn body_text(&self) -> &str {
        match &self.body {
            FrameBody::Text(text) => text,
            _ => "",
        }
    }

    /// Produce the exact wire text for this frame.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(16);
        out.push(self.engine.digit());
        if let Some(code) = self.message {
            out.push(code.digit());
        }
        if let Some(namespace) = &self.namespace {
            out.push_str(namespace);
            out.push(',');
        }
        match &self.body {
            FrameBody::None => {}
            FrameBody::Text(text) => out.push_str(text),
            FrameBody::Event { name, args } => {
                out.push('[');
                // Value::to_string is infallible, unlike serde_json::to_string
                out.push_str(&serde_json::Value::String(name.clone()).to_string());
                if !args.is_empty() {
                    out.push(',');
                    out.push_str(args);
                }
                out.push(']');
            }
        }
        out
    }

    /// Parse the wire text of a frame.
    pub fn decode(raw: &str) -> Result<Frame> {
        let mut chars = raw.chars();
        let engine = chars
            .next()
            .and_then(EngineCode::from_digit)
            .ok_or_else(|| decode_err(raw, "missing or unknown engine code"))?;
        let rest = &raw[1..];

        if engine != EngineCode::Message {
            return Ok(Frame {
                engine,
                message: None,
                namespace: None,
                body: if rest.is_empty() {
                    FrameBody::None
                } else {
                    FrameBody::Text(rest.to_string())
                },
            });
        }

        let message = rest
            .chars()
            .next()
            .and_then(MessageCode::from_digit)
            .ok_or_else(|| decode_err(raw, "missing or unknown message code"))?;
        let mut rest = &rest[1..];

        let mut namespace = None;
        if rest.starts_with('/') {
            // The comma is optional when the frame carries no body.
            match rest.find(',') {
                Some(idx) => {
                    namespace = normalize_namespace(&rest[..idx]);
                    rest = &rest[idx + 1..];
                }
                None => {
                    namespace = normalize_namespace(rest);
                    rest = "";
                }
            }
        }

        let body = match message {
            MessageCode::Event => {
                let (name, args) = decode_event_body(raw, rest)?;
                FrameBody::Event { name, args }
            }
            _ if rest.is_empty() => FrameBody::None,
            _ => FrameBody::Text(rest.to_string()),
        };

        Ok(Frame {
            engine,
            message: Some(message),
            namespace,
            body,
        })
    }
}

/// Split an event body `["name",<args>]` into the event name and the raw
/// argument text between the matching comma and the closing bracket.
///
/// The name scan is escape-aware, so quotes inside the event name do not
/// shift the argument boundary.
fn decode_event_body(raw: &str, body: &str) -> Result<(String, String)> {
    let inner = body
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .ok_or_else(|| decode_err(raw, "event body is not a bracketed array"))?;

    let rest = inner.trim_start();
    if !rest.starts_with('"') {
        return Err(decode_err(raw, "event name is not a string literal"));
    }

    let mut end = None;
    let mut escaped = false;
    for (idx, ch) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => {
                end = Some(idx);
                break;
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| decode_err(raw, "unterminated event name"))?;
    let name: String = serde_json::from_str(&rest[..=end])
        .map_err(|_| decode_err(raw, "invalid event name escape"))?;

    let after = rest[end + 1..].trim_start();
    let args = match after.strip_prefix(',') {
        Some(args) => args.to_string(),
        None if after.is_empty() => String::new(),
        None => return Err(decode_err(raw, "expected ',' after event name")),
    };
    Ok((name, args))
}

fn decode_err(raw: &str, reason: &str) -> SioError {
    SioError::FrameDecode {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}
