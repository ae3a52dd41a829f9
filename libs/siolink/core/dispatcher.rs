//! Inbound frame dispatch.
//!
//! The dispatcher is a pure decision component: it decodes a raw frame,
//! drives the registry callbacks, and reports what the connection task
//! must write or do next. All transport I/O stays with the caller, which
//! keeps the whole state machine unit-testable without a socket.

use crate::codec::frame::{EngineCode, Frame, FrameBody, MessageCode};
use crate::core::registry::{NamespaceRegistry, Teardown};
use crate::traits::{Result, SioError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outbound action requested by a dispatched frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    /// Nothing to write.
    None,
    /// Write this frame to the transport.
    Reply(Frame),
    /// Send a scoped DISCONNECT for the namespace; transport stays open.
    ScopedDisconnect(String),
    /// Send a root DISCONNECT while still connected, then close.
    FullDisconnect,
}

/// Demultiplexes inbound frames to session control and namespace subscribers.
pub struct Dispatcher {
    registry: Arc<NamespaceRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<NamespaceRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch one raw inbound frame.
    ///
    /// Errors mean the frame was dropped (malformed or unsupported); they
    /// never require tearing the session down.
    pub fn dispatch(&self, raw: &str) -> Result<Effect> {
        let frame = Frame::decode(raw)?;
        match frame.engine() {
            EngineCode::Open | EngineCode::Close => {
                warn!(raw, "unexpected engine control frame over websocket, ignoring");
                Ok(Effect::None)
            }
            EngineCode::Ping => {
                debug!("ping received, replying with pong");
                Ok(Effect::Reply(Frame::pong(frame.body_text())))
            }
            EngineCode::Pong => {
                if frame.body_text() == "probe" {
                    debug!("upgrade probe confirmed, acknowledging");
                    Ok(Effect::Reply(Frame::upgrade_ack()))
                } else {
                    debug!("pong received");
                    Ok(Effect::None)
                }
            }
            EngineCode::Message => self.dispatch_message(raw, &frame),
            EngineCode::Upgrade => {
                warn!("upgrade frame not implemented, ignoring");
                Ok(Effect::None)
            }
            EngineCode::Noop => Ok(Effect::None),
        }
    }

    fn dispatch_message(&self, raw: &str, frame: &Frame) -> Result<Effect> {
        // Decode guarantees a message code for MESSAGE frames.
        let Some(code) = frame.message() else {
            return Ok(Effect::None);
        };
        let namespace = frame.namespace_or_root();
        let subscriber = self.registry.lookup(namespace);

        match code {
            MessageCode::Connect => {
                self.registry.mark_active(namespace);
                match &subscriber {
                    Some(subscriber) => subscriber.on_connect(frame.body_text()),
                    None => debug!(namespace, "connect for unregistered namespace"),
                }
                Ok(Effect::None)
            }
            MessageCode::Disconnect => {
                debug!(namespace, "server requested namespace disconnect");
                if let Some(subscriber) = &subscriber {
                    subscriber.on_disconnect_requested();
                }
                match self.registry.unregister(namespace) {
                    Teardown::Full => Ok(Effect::FullDisconnect),
                    Teardown::Scoped => Ok(Effect::ScopedDisconnect(namespace.to_string())),
                }
            }
            MessageCode::Event => {
                let FrameBody::Event { name, args } = frame.body() else {
                    return Ok(Effect::None);
                };
                match &subscriber {
                    Some(subscriber) => subscriber.on_event(name, &event_argument(args)),
                    None => warn!(namespace, event = %name, "dropping event for unregistered namespace"),
                }
                Ok(Effect::None)
            }
            // Acknowledgement correlation is out of scope; accept silently.
            MessageCode::Ack => {
                debug!(namespace, "message ack received");
                Ok(Effect::None)
            }
            MessageCode::Error => {
                match &subscriber {
                    Some(subscriber) => subscriber.on_error(frame.body_text()),
                    None => warn!(namespace, body = frame.body_text(), "error for unregistered namespace"),
                }
                Ok(Effect::None)
            }
            MessageCode::BinaryEvent | MessageCode::BinaryAck => Err(SioError::UnsupportedFrame(
                format!("binary frames are not supported: {raw:?}"),
            )),
        }
    }
}

/// A single JSON string argument is delivered decoded; any other payload
/// shape is handed to the subscriber as raw text.
fn event_argument(args: &str) -> String {
    serde_json::from_str::<String>(args).unwrap_or_else(|_| args.to_string())
}
