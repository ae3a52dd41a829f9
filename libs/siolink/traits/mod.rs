//! Core traits and types for the siolink client.
//!
//! - **NamespaceSubscriber**: per-namespace callback capability set
//! - **SioError / Result**: the crate-wide error taxonomy
//! - **Headers**: caller-supplied HTTP headers for the handshake

pub mod error;
pub mod headers;
pub mod subscriber;

pub use error::{Result, SioError};
pub use headers::Headers;
pub use subscriber::NamespaceSubscriber;
