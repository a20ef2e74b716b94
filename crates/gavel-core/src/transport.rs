//! Transport abstraction for per-auction channels.
//!
//! A transport owns one full-duplex, message-oriented connection and knows
//! nothing about auctions. Production uses WebSockets; tests use an in-memory
//! simulated server.
//!
//! # Delivery Contract
//!
//! Inbound notifications arrive as [`TransportEvent`]s on an unbounded channel
//! returned by [`Transport::open`]:
//!
//! - at most one `Opened`, and it precedes every `Message`
//! - `Closed` is terminal; nothing follows it and the link is spent
//! - after [`TransportLink::close`] returns, nothing more is delivered
//!
//! Adapters emit through an [`EventSink`], which enforces all three rules so
//! individual transports cannot get them wrong.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use url::Url;

/// Notification from a transport to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established.
    Opened,

    /// One inbound text frame, uninterpreted.
    Message(String),

    /// Connection ended, or never came up.
    Closed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Factory for connections to per-auction channels.
pub trait Transport: Send + Sync + 'static {
    /// Handle to one open (or opening) connection.
    type Link: TransportLink;

    /// Begin connecting to `address`.
    ///
    /// Never blocks. Success or failure is reported later through the
    /// returned event channel.
    fn open(&self, address: &Url) -> (Self::Link, mpsc::UnboundedReceiver<TransportEvent>);
}

/// Handle to one connection.
pub trait TransportLink: Send + 'static {
    /// Queue a text frame for transmission.
    ///
    /// Returns `false` if the connection is not open. Acceptance says nothing
    /// about delivery.
    fn send(&self, payload: String) -> bool;

    /// Tear the connection down. Idempotent, and safe before the connection
    /// has opened.
    fn close(&self);
}

#[derive(Debug)]
struct SinkState {
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    opened: bool,
}

/// Gate through which an adapter delivers [`TransportEvent`]s.
///
/// Cloning yields another handle to the same gate.
#[derive(Debug, Clone)]
pub struct EventSink {
    state: Arc<Mutex<SinkState>>,
}

impl EventSink {
    /// Create a sink and the receiver its events are delivered to.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = SinkState { events: Some(tx), opened: false };
        let sink = Self { state: Arc::new(Mutex::new(state)) };
        (sink, rx)
    }

    /// Deliver `event` if the contract allows it.
    ///
    /// Returns whether the event was delivered.
    pub fn emit(&self, event: TransportEvent) -> bool {
        let mut state = self.lock();
        if state.events.is_none() {
            return false;
        }

        match &event {
            TransportEvent::Opened if state.opened => {
                tracing::debug!("dropping duplicate open notification");
                return false;
            },
            TransportEvent::Opened => state.opened = true,
            TransportEvent::Message(_) if !state.opened => {
                tracing::debug!("dropping frame received before open");
                return false;
            },
            TransportEvent::Message(_) | TransportEvent::Closed { .. } => {},
        }

        let terminal = matches!(event, TransportEvent::Closed { .. });
        let delivered = state.events.as_ref().is_some_and(|events| events.send(event).is_ok());
        if terminal {
            state.events = None;
        }
        delivered
    }

    /// Stop all further delivery.
    pub fn detach(&self) {
        self.lock().events = None;
    }

    /// True once `Opened` was delivered and before the sink was detached or
    /// closed.
    pub fn is_open(&self) -> bool {
        let state = self.lock();
        state.opened && state.events.is_some()
    }

    /// True once nothing more will be delivered.
    pub fn is_detached(&self) -> bool {
        self.lock().events.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
