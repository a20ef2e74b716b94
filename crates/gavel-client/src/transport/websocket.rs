//! WebSocket transport using tokio-tungstenite.
//!
//! Each [`WsLink`] is backed by one task that owns the socket. Outbound frames
//! reach it through an unbounded queue so [`TransportLink::send`] never
//! blocks; inbound frames leave through the link's [`EventSink`].

use futures_util::{SinkExt, StreamExt};
use gavel_core::{EventSink, Transport, TransportEvent, TransportLink};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// Opens per-auction channels over WebSockets (`ws` or `wss`).
#[derive(Debug, Clone)]
pub struct WsTransport {
    _private: (),
}

impl WsTransport {
    /// Create a transport, installing the ring crypto provider for `wss` if
    /// the host has not installed one.
    pub fn new() -> Self {
        // Err means a provider is already installed, which is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self { _private: () }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WsTransport {
    type Link = WsLink;

    fn open(&self, address: &Url) -> (WsLink, mpsc::UnboundedReceiver<TransportEvent>) {
        let (sink, events) = EventSink::channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_connection(
                    address.clone(),
                    sink.clone(),
                    outbound_rx,
                    shutdown_rx,
                ));
            },
            Err(error) => {
                tracing::warn!(%error, "no runtime to run the websocket");
                sink.emit(TransportEvent::Closed { reason: error.to_string() });
            },
        }

        (WsLink { sink, outbound: outbound_tx, shutdown: shutdown_tx }, events)
    }
}

/// Handle to one WebSocket connection.
#[derive(Debug)]
pub struct WsLink {
    sink: EventSink,
    outbound: mpsc::UnboundedSender<String>,
    shutdown: watch::Sender<bool>,
}

impl TransportLink for WsLink {
    fn send(&self, payload: String) -> bool {
        self.sink.is_open() && self.outbound.send(payload).is_ok()
    }

    fn close(&self) {
        self.sink.detach();
        self.shutdown.send_replace(true);
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_connection(
    address: Url,
    sink: EventSink,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let connected = tokio::select! {
        result = connect_async(address.as_str()) => result,
        _ = shutdown.changed() => {
            tracing::debug!("connect cancelled");
            return;
        },
    };

    let stream = match connected {
        Ok((stream, response)) => {
            tracing::debug!(status = %response.status(), "websocket handshake complete");
            stream
        },
        Err(error) => {
            tracing::warn!(%error, "websocket connect failed");
            sink.emit(TransportEvent::Closed { reason: error.to_string() });
            return;
        },
    };

    sink.emit(TransportEvent::Opened);
    let (mut writer, mut reader) = stream.split();

    let reason = loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if let Err(error) = writer.send(Message::Close(None)).await {
                    tracing::debug!(%error, "close frame not sent");
                }
                return;
            },
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(error) = writer.send(Message::Text(text)).await {
                        break error.to_string();
                    }
                },
                None => {
                    if let Err(error) = writer.send(Message::Close(None)).await {
                        tracing::debug!(%error, "close frame not sent");
                    }
                    return;
                },
            },
            message = reader.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    sink.emit(TransportEvent::Message(text));
                },
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        sink.emit(TransportEvent::Message(text));
                    },
                    Err(_) => tracing::debug!("dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) if !frame.reason.is_empty() => frame.reason.into_owned(),
                        Some(frame) => format!("closed by server ({})", u16::from(frame.code)),
                        None => "closed by server".to_string(),
                    };
                },
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {},
                Some(Err(error)) => break error.to_string(),
                None => break "connection ended".to_string(),
            },
        }
    };

    tracing::info!(%reason, "websocket closed");
    sink.emit(TransportEvent::Closed { reason });
}
