//! Simulated auction server.
//!
//! Reproduces the live channel's observable behaviour:
//!
//! - tokens map to users, and only an auction's participants may connect
//! - a freshly opened channel receives the untyped snapshot
//! - an accepted bid is broadcast to every listener as a typed
//!   `auction_update`, then confirmed to the bidder with a `success` frame
//! - rejections use each of the server's error shapes (string, list, and
//!   field map)
//!
//! Fault injection hooks let tests refuse connections, drop every channel,
//! push raw frames, and hold bid responses so a bid stays in flight.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use gavel_core::{EventSink, TransportEvent};
use gavel_proto::{
    AuctionStatus, AuctionUpdate, LastVote, Price,
    inbound::{AUCTION_UPDATE_TYPE, flatten_reason},
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use url::Url;

use crate::sim_transport::{SimLink, SimTransport};

/// Close reason for a refused connection.
pub const REFUSED_REASON: &str = "connection refused";

/// Close reason for a user who may not watch the auction.
pub const FORBIDDEN_REASON: &str = "not a participant of this auction";

/// One auction as stored by the simulated server.
#[derive(Debug, Clone)]
pub struct SimAuction {
    title: String,
    description: String,
    image: Option<String>,
    starting_price: Price,
    status: AuctionStatus,
    last_vote: Option<LastVote>,
    participants: HashSet<String>,
}

impl SimAuction {
    /// A started auction with no bids and no participants.
    pub fn new(title: impl Into<String>, starting_price: Price) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            image: None,
            starting_price,
            status: AuctionStatus::Started,
            last_vote: None,
            participants: HashSet::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: AuctionStatus) -> Self {
        self.status = status;
        self
    }

    /// Seed an existing highest bid.
    #[must_use]
    pub fn with_last_vote(mut self, bidder: impl Into<String>, amount: Price) -> Self {
        self.last_vote = Some(LastVote { amount, bidder: bidder.into() });
        self
    }

    /// Allow `user` to watch and bid.
    #[must_use]
    pub fn with_participant(mut self, user: impl Into<String>) -> Self {
        self.participants.insert(user.into());
        self
    }

    /// Highest bid, or the starting price.
    pub fn current_price(&self) -> Price {
        self.last_vote.as_ref().map_or(self.starting_price, |vote| vote.amount)
    }

    fn update(&self) -> AuctionUpdate {
        AuctionUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            starting_price: self.starting_price,
            status: self.status,
            last_vote: self.last_vote.clone(),
        }
    }
}

#[derive(Debug)]
struct Connection {
    id: u64,
    auction_id: String,
    user: String,
    sink: EventSink,
}

#[derive(Debug, Default)]
struct ServerState {
    auctions: HashMap<String, SimAuction>,
    users: HashMap<String, String>,
    connections: Vec<Connection>,
    received: Vec<(String, String)>,
    held: Vec<(u64, String)>,
    refuse: bool,
    hold_responses: bool,
    next_connection: u64,
}

impl ServerState {
    fn connection(&self, id: u64) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    fn broadcast(&self, auction_id: &str, frame: &str) -> usize {
        self.connections
            .iter()
            .filter(|connection| connection.auction_id == auction_id)
            .filter(|connection| connection.sink.emit(TransportEvent::Message(frame.to_string())))
            .count()
    }

    fn respond(&mut self, id: u64, frame: String) {
        if self.hold_responses {
            self.held.push((id, frame));
        } else if let Some(connection) = self.connection(id) {
            connection.sink.emit(TransportEvent::Message(frame));
        }
    }
}

/// Shared handle to one simulated server.
///
/// Clones refer to the same server.
#[derive(Debug, Clone, Default)]
pub struct SimServer {
    state: Arc<Mutex<ServerState>>,
}

impl SimServer {
    /// An empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose connections land on this server.
    pub fn transport(&self) -> SimTransport {
        SimTransport::new(self.clone())
    }

    /// Register a token for `user`.
    pub fn add_user(&self, token: impl Into<String>, user: impl Into<String>) {
        self.lock().users.insert(token.into(), user.into());
    }

    /// Register (or replace) an auction.
    pub fn add_auction(&self, auction_id: impl Into<String>, auction: SimAuction) {
        self.lock().auctions.insert(auction_id.into(), auction);
    }

    /// Current state of an auction, as the wire would carry it.
    pub fn auction(&self, auction_id: &str) -> Option<AuctionUpdate> {
        self.lock().auctions.get(auction_id).map(SimAuction::update)
    }

    /// Refuse (or accept again) new connections.
    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse = refuse;
    }

    /// Queue bid responses instead of sending them.
    pub fn hold_responses(&self, hold: bool) {
        self.lock().hold_responses = hold;
    }

    /// Send every held response, in order. Returns how many were delivered.
    pub fn release_held(&self) -> usize {
        let mut state = self.lock();
        let held = std::mem::take(&mut state.held);
        held.into_iter()
            .filter(|(id, frame)| {
                state.connection(*id).is_some_and(|connection| {
                    connection.sink.emit(TransportEvent::Message(frame.clone()))
                })
            })
            .count()
    }

    /// Close every open channel with `reason`.
    pub fn drop_all(&self, reason: &str) {
        let mut state = self.lock();
        for connection in state.connections.drain(..) {
            connection.sink.emit(TransportEvent::Closed { reason: reason.to_string() });
        }
        tracing::debug!(%reason, "dropped all connections");
    }

    /// Push a raw frame to every listener of an auction. Returns how many
    /// listeners received it.
    pub fn inject(&self, auction_id: &str, raw: &str) -> usize {
        self.lock().broadcast(auction_id, raw)
    }

    /// Change an auction's status and broadcast the new snapshot.
    pub fn set_status(&self, auction_id: &str, status: AuctionStatus) {
        let mut state = self.lock();
        let Some(auction) = state.auctions.get_mut(auction_id) else {
            return;
        };
        auction.status = status;
        let frame = typed_update(&auction.update());
        state.broadcast(auction_id, &frame);
    }

    /// Place a bid on behalf of a bidder who is not connected through this
    /// server, e.g. another browser. Broadcasts the new snapshot on success.
    ///
    /// # Errors
    ///
    /// The rejection text the server would have sent.
    pub fn place_bid(&self, auction_id: &str, user: &str, price: Price) -> Result<(), String> {
        let mut state = self.lock();
        arbitrate(&mut state, auction_id, user, price)
            .map(|_| ())
            .map_err(|rejection| flatten_reason(&rejection))
    }

    /// Frames received from connections authenticated as `user`, in arrival
    /// order.
    pub fn frames_from(&self, user: &str) -> Vec<String> {
        self.lock()
            .received
            .iter()
            .filter(|(sender, _)| sender == user)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    /// Channels currently open on an auction.
    pub fn listeners(&self, auction_id: &str) -> usize {
        self.lock()
            .connections
            .iter()
            .filter(|connection| connection.auction_id == auction_id && connection.sink.is_open())
            .count()
    }

    pub(crate) fn connect(
        &self,
        address: &Url,
    ) -> (SimLink, mpsc::UnboundedReceiver<TransportEvent>) {
        let (sink, events) = EventSink::channel();
        let mut state = self.lock();
        state.next_connection += 1;
        let id = state.next_connection;
        let link = SimLink::new(id, self.clone(), sink.clone());

        if state.refuse {
            sink.emit(TransportEvent::Closed { reason: REFUSED_REASON.to_string() });
            return (link, events);
        }

        let auction_id = address
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
            .unwrap_or_default()
            .to_string();
        let user = address
            .query_pairs()
            .find(|(key, _)| key == "token")
            .and_then(|(_, token)| state.users.get(token.as_ref()).cloned());

        let admitted = user.filter(|user| {
            state
                .auctions
                .get(&auction_id)
                .is_some_and(|auction| auction.participants.contains(user))
        });
        let (Some(user), Some(auction)) = (admitted, state.auctions.get(&auction_id)) else {
            tracing::debug!(auction = %auction_id, "rejecting connection");
            sink.emit(TransportEvent::Closed { reason: FORBIDDEN_REASON.to_string() });
            return (link, events);
        };

        let initial = untyped_update(&auction.update());
        sink.emit(TransportEvent::Opened);
        sink.emit(TransportEvent::Message(initial));

        tracing::debug!(auction = %auction_id, %user, connection = id, "connection accepted");
        state.connections.push(Connection { id, auction_id, user, sink });
        (link, events)
    }

    pub(crate) fn receive(&self, id: u64, payload: &str) {
        let mut state = self.lock();
        let Some(connection) = state.connection(id) else {
            return;
        };
        let auction_id = connection.auction_id.clone();
        let user = connection.user.clone();
        state.received.push((user.clone(), payload.to_string()));

        let response = match serde_json::from_str::<Value>(payload) {
            Ok(frame) if frame.get("action").and_then(Value::as_str) == Some("place_bid") => {
                match bid_price(&frame) {
                    Ok(price) => match arbitrate(&mut state, &auction_id, &user, price) {
                        Ok(price) => {
                            json!({ "success": format!("Bid of {price} placed successfully.") })
                        },
                        Err(rejection) => json!({ "error": rejection }),
                    },
                    Err(reason) => json!({ "error": reason }),
                }
            },
            Ok(_) => return,
            Err(_) => json!({ "error": "Invalid JSON format" }),
        };

        state.respond(id, response.to_string());
    }

    pub(crate) fn disconnect(&self, id: u64) {
        self.lock().connections.retain(|connection| connection.id != id);
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bid_price(frame: &Value) -> Result<Price, &'static str> {
    match frame.get("price") {
        None | Some(Value::Null) => Err("Price is required."),
        Some(Value::String(text)) if text.is_empty() => Err("Price is required."),
        Some(price) => serde_json::from_value(price.clone()).map_err(|_| "Invalid price format."),
    }
}

/// Accept or reject a bid; on acceptance record it and broadcast.
fn arbitrate(
    state: &mut ServerState,
    auction_id: &str,
    user: &str,
    price: Price,
) -> Result<Price, Value> {
    let Some(auction) = state.auctions.get_mut(auction_id) else {
        return Err(json!("Auction not found."));
    };
    if auction.status != AuctionStatus::Started {
        let message = format!("Auction is {}; bids are closed.", auction.status);
        return Err(json!({ "status": [message] }));
    }
    let current = auction.current_price();
    if price <= current {
        return Err(json!([format!("Bid must be higher than the current price of {current}.")]));
    }

    auction.last_vote = Some(LastVote { amount: price, bidder: user.to_string() });
    let frame = typed_update(&auction.update());
    let listeners = state.broadcast(auction_id, &frame);
    tracing::debug!(auction = auction_id, %price, listeners, "bid accepted");
    Ok(price)
}

fn untyped_update(update: &AuctionUpdate) -> String {
    serde_json::to_value(update).unwrap_or(Value::Null).to_string()
}

fn typed_update(update: &AuctionUpdate) -> String {
    let data = serde_json::to_value(update).unwrap_or(Value::Null);
    json!({ "type": AUCTION_UPDATE_TYPE, "data": data }).to_string()
}

#[cfg(test)]
mod tests {
    use gavel_core::{Transport, TransportLink};
    use gavel_proto::Inbound;

    use super::*;

    const ADDRESS: &str = "ws://localhost:9000/ws/auction/7/?token=alice-token";

    fn server() -> SimServer {
        let server = SimServer::new();
        server.add_user("alice-token", "alice@example.com");
        server.add_user("mallory-token", "mallory@example.com");
        server.add_auction(
            "7",
            SimAuction::new("Lamp", Price::from_minor_units(1000))
                .with_participant("alice@example.com"),
        );
        server
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> Vec<TransportEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn messages(events: &[TransportEvent]) -> Vec<Inbound> {
        events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Message(raw) => gavel_proto::decode(raw).ok(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn participant_receives_untyped_snapshot_on_open() {
        let server = server();
        let (_link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());

        let events = drain(&mut rx);
        assert_eq!(events[0], TransportEvent::Opened);
        let TransportEvent::Message(raw) = &events[1] else { panic!("expected snapshot") };
        assert!(!raw.contains("\"type\""));
        let inbound = messages(&events);
        assert!(matches!(&inbound[0], Inbound::Snapshot(update) if update.title == "Lamp"));
        assert_eq!(server.listeners("7"), 1);
    }

    #[test]
    fn outsider_is_closed_before_open() {
        let server = server();
        let address = Url::parse("ws://localhost:9000/ws/auction/7/?token=mallory-token").unwrap();
        let (link, mut rx) = server.transport().open(&address);

        assert_eq!(drain(&mut rx), vec![TransportEvent::Closed {
            reason: FORBIDDEN_REASON.into()
        }]);
        assert!(!link.send("{}".into()));
        assert_eq!(server.listeners("7"), 0);
    }

    #[test]
    fn accepted_bid_is_broadcast_then_confirmed() {
        let server = server();
        let (link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());
        drain(&mut rx);

        assert!(link.send(r#"{"action":"place_bid","price":"15.00"}"#.into()));

        let inbound = messages(&drain(&mut rx));
        assert_eq!(inbound.len(), 2);
        let Inbound::Snapshot(update) = &inbound[0] else { panic!("expected broadcast") };
        assert_eq!(
            update.last_vote.as_ref().map(|vote| vote.amount),
            Some(Price::from_minor_units(1500))
        );
        assert_eq!(inbound[1], Inbound::BidAccepted {
            message: "Bid of 15.00 placed successfully.".into()
        });
    }

    #[test]
    fn rejections_use_every_error_shape() {
        let server = server();
        let (link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());
        drain(&mut rx);

        link.send(r#"{"action":"place_bid","price":"5"}"#.into());
        link.send(r#"{"action":"place_bid"}"#.into());
        link.send("not json".into());
        server.set_status("7", AuctionStatus::Ended);
        link.send(r#"{"action":"place_bid","price":"50"}"#.into());

        let reasons: Vec<_> = messages(&drain(&mut rx))
            .into_iter()
            .filter_map(|inbound| match inbound {
                Inbound::BidRejected { reason } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(reasons, vec![
            "Bid must be higher than the current price of 10.00.".to_string(),
            "Price is required.".to_string(),
            "Invalid JSON format".to_string(),
            "Auction is ended; bids are closed.".to_string(),
        ]);
        assert_eq!(server.frames_from("alice@example.com").len(), 4);
    }

    #[test]
    fn held_responses_are_released_in_order() {
        let server = server();
        let (link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());
        drain(&mut rx);

        server.hold_responses(true);
        link.send(r#"{"action":"place_bid","price":"12"}"#.into());
        // The broadcast is not a response and is never held
        assert_eq!(messages(&drain(&mut rx)).len(), 1);

        assert_eq!(server.release_held(), 1);
        assert!(matches!(messages(&drain(&mut rx))[0], Inbound::BidAccepted { .. }));
    }

    #[test]
    fn drop_all_closes_every_listener() {
        let server = server();
        let (_link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());
        drain(&mut rx);

        server.drop_all("server restart");
        assert_eq!(drain(&mut rx), vec![TransportEvent::Closed {
            reason: "server restart".into()
        }]);
        assert_eq!(server.listeners("7"), 0);
    }

    #[test]
    fn refused_connection_never_opens() {
        let server = server();
        server.refuse_connections(true);
        let (_link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());

        assert_eq!(drain(&mut rx), vec![TransportEvent::Closed {
            reason: REFUSED_REASON.into()
        }]);
    }

    #[test]
    fn closed_link_hears_nothing() {
        let server = server();
        let (link, mut rx) = server.transport().open(&Url::parse(ADDRESS).unwrap());
        drain(&mut rx);

        link.close();
        assert_eq!(server.inject("7", r#"{"success":"late"}"#), 0);
        server.place_bid("7", "bob@example.com", Price::from_minor_units(2000)).unwrap();
        assert!(drain(&mut rx).is_empty());
    }
}
