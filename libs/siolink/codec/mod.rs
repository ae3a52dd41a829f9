//! Wire codec for the two-level Engine.IO / Socket.IO frame format.

pub mod frame;

pub use frame::{EngineCode, Frame, FrameBody, MessageCode};
