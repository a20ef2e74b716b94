//! Transport that connects sessions to a [`SimServer`].

use gavel_core::{EventSink, Transport, TransportEvent, TransportLink};
use tokio::sync::mpsc;
use url::Url;

use crate::sim_server::SimServer;

/// In-memory transport. Connection outcomes are queued before
/// [`Transport::open`] returns.
#[derive(Debug, Clone)]
pub struct SimTransport {
    server: SimServer,
}

impl SimTransport {
    /// Transport bound to `server`.
    pub fn new(server: SimServer) -> Self {
        Self { server }
    }
}

impl Transport for SimTransport {
    type Link = SimLink;

    fn open(&self, address: &Url) -> (SimLink, mpsc::UnboundedReceiver<TransportEvent>) {
        self.server.connect(address)
    }
}

/// One simulated channel.
#[derive(Debug)]
pub struct SimLink {
    id: u64,
    server: SimServer,
    sink: EventSink,
}

impl SimLink {
    pub(crate) fn new(id: u64, server: SimServer, sink: EventSink) -> Self {
        Self { id, server, sink }
    }
}

impl TransportLink for SimLink {
    fn send(&self, payload: String) -> bool {
        if !self.sink.is_open() {
            return false;
        }
        self.server.receive(self.id, &payload);
        true
    }

    fn close(&self) {
        self.sink.detach();
        self.server.disconnect(self.id);
    }
}
