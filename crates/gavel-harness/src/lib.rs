//! Deterministic simulation harness for Gavel session testing.
//!
//! An in-memory stand-in for the auction server's live channel, plus a
//! [`gavel_core::Transport`] that connects to it. Everything happens
//! synchronously on the caller's thread; the only asynchrony left is the
//! session's own event pump, so tests are reproducible without timers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_server;
pub mod sim_transport;

pub use sim_server::{SimAuction, SimServer};
pub use sim_transport::{SimLink, SimTransport};
