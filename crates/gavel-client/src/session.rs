//! Session facade.
//!
//! [`LiveSession`] drives a [`gavel_core::Session`] against a real transport.
//! All state lives behind one mutex, and every transition (an inbound event
//! applied by the pump task, or a bid submitted by the consumer) runs inside
//! that single critical section. Nothing here blocks: bids are fire-and-forget
//! and the in-flight phase is how a consumer observes the pending round trip.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use gavel_core::{
    AddressError, AuctionId, Credential, Session, SessionAction, SessionConfig, SessionError,
    SessionPhase, SessionView, Transport, TransportEvent, TransportLink,
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use url::Url;

use crate::subscription::Subscription;

struct Shared<L> {
    session: Session,
    link: Option<L>,
    subscribers: Vec<mpsc::UnboundedSender<SessionView>>,
    pump: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
}

impl<L: TransportLink> Shared<L> {
    fn apply(&mut self, event: TransportEvent) {
        let actions = match event {
            TransportEvent::Opened => self.session.handle_open(),
            TransportEvent::Message(raw) => self.session.handle_message(&raw),
            TransportEvent::Closed { reason } => {
                self.link = None;
                self.session.handle_close(&reason)
            },
        };
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Publish(view) => {
                    let closed = view.phase == SessionPhase::Closed;
                    self.subscribers.retain(|subscriber| subscriber.send(view.clone()).is_ok());
                    // Nothing can change after Closed, so end every stream
                    if closed {
                        self.subscribers.clear();
                    }
                },
                SessionAction::Close { reason } => {
                    tracing::debug!(%reason, "closing transport");
                    self.teardown();
                },
            }
        }
    }

    fn teardown(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.subscribers.clear();
        if let Some(link) = self.link.take() {
            link.close();
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// A consumer's handle on one live auction.
///
/// Identity (auction and credential) is fixed at construction. A closed
/// session cannot be restarted; build a new one to reconnect. Dropping the
/// session stops it.
pub struct LiveSession<T: Transport> {
    transport: T,
    address: Url,
    shared: Arc<Mutex<Shared<T::Link>>>,
}

impl<T: Transport> LiveSession<T> {
    /// Create a session in `Idle`. No connection is made until [`start`].
    ///
    /// [`start`]: Self::start
    pub fn new(
        transport: T,
        config: &SessionConfig,
        auction_id: AuctionId,
        credential: &Credential,
    ) -> Result<Self, AddressError> {
        let address = config.channel_address(&auction_id, credential)?;
        let shared = Shared {
            session: Session::new(auction_id),
            link: None,
            subscribers: Vec::new(),
            pump: None,
            stopped: Arc::new(AtomicBool::new(false)),
        };
        Ok(Self { transport, address, shared: Arc::new(Mutex::new(shared)) })
    }

    /// Auction this session watches.
    pub fn auction_id(&self) -> AuctionId {
        lock(&self.shared).session.auction_id().clone()
    }

    /// Current view.
    pub fn view(&self) -> SessionView {
        lock(&self.shared).session.view()
    }

    /// Subscribe to changes. The current view is delivered first.
    pub fn subscribe(&self) -> Subscription {
        let mut shared = lock(&self.shared);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Subscription::new(rx, Arc::clone(&shared.stopped));

        if tx.send(shared.session.view()).is_ok()
            && shared.session.phase() != SessionPhase::Closed
        {
            shared.subscribers.push(tx);
        }
        subscription
    }

    /// Open the channel.
    ///
    /// Returns as soon as the transport has begun connecting; the outcome is
    /// published to subscribers.
    ///
    /// # Errors
    ///
    /// - `NoRuntime` if called outside a Tokio runtime
    /// - `AlreadyStarted` if the session is connecting or live
    /// - `SessionClosed` once the session has closed
    pub fn start(&self) -> Result<(), SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let mut shared = lock(&self.shared);
        let actions = shared.session.start()?;

        let (link, mut events) = self.transport.open(&self.address);
        shared.link = Some(link);
        shared.execute(actions);

        let pump_state = Arc::clone(&self.shared);
        shared.pump = Some(runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                lock(&pump_state).apply(event);
            }
        }));
        Ok(())
    }

    /// Submit a bid.
    ///
    /// On success the bid is on the wire and the submission phase is
    /// `InFlight`; the server's answer arrives later as a published view.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not a positive decimal
    /// - `NotConnected` unless live, or if the transport refused the frame
    /// - `SubmissionInProgress` if a bid is already awaiting an answer
    pub fn submit_bid(&self, amount: &str) -> Result<(), SessionError> {
        let mut shared = lock(&self.shared);
        let bid = shared.session.prepare_bid(amount)?;

        let accepted = shared.link.as_ref().is_some_and(|link| link.send(bid.frame));
        if !accepted {
            tracing::warn!(amount = %bid.amount, "transport refused bid frame");
            return Err(SessionError::NotConnected { phase: shared.session.phase() });
        }

        let actions = shared.session.bid_sent()?;
        shared.execute(actions);
        tracing::info!(amount = %bid.amount, "bid submitted");
        Ok(())
    }

    /// Stop the session.
    ///
    /// Safe in any phase and idempotent. Cancels a pending connect, abandons
    /// a bid in flight, and guarantees no subscriber hears anything once this
    /// returns.
    pub fn stop(&self) {
        let mut shared = lock(&self.shared);
        let actions = shared.session.stop();
        shared.execute(actions);
        shared.teardown();
    }
}

impl<T: Transport> Drop for LiveSession<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Transport> std::fmt::Debug for LiveSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = lock(&self.shared);
        f.debug_struct("LiveSession")
            .field("auction_id", shared.session.auction_id())
            .field("phase", &shared.session.phase())
            .finish_non_exhaustive()
    }
}

fn lock<L>(shared: &Mutex<Shared<L>>) -> MutexGuard<'_, Shared<L>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
