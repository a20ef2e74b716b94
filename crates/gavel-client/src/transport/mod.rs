//! Transport implementations.
//!
//! The WebSocket transport is behind the `transport` feature so that
//! consumers bringing their own [`gavel_core::Transport`] (or tests using the
//! simulation harness) do not pull in a TLS stack.

#[cfg(feature = "transport")]
mod websocket;

#[cfg(feature = "transport")]
pub use websocket::{WsLink, WsTransport};
