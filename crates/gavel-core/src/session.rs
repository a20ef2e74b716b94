//! Live bidding session state machine.
//!
//! This module tracks one client's view of one auction: the connection
//! lifecycle, the latest authoritative snapshot, and the outcome of the most
//! recent bid.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods take inputs (transport events, user requests) and mutate state
//! - Methods return `Vec<SessionAction>` describing effects
//! - A driver executes actions (publish views to subscribers, close the link)
//!
//! The machine performs no I/O and is not thread-safe on its own. A driver
//! must serialize every call, e.g. behind one mutex, so that a snapshot
//! replacement can never interleave with a submission transition.
//!
//! # Session Phase
//!
//! ```text
//! ┌──────┐ start ┌────────────┐ open  ┌──────┐
//! │ Idle │──────>│ Connecting │──────>│ Live │
//! └──────┘       └────────────┘       └──────┘
//!                      │                 │
//!                      │ close/stop      │ close/stop
//!                      ↓                 ↓
//!                 ┌─────────────────────────┐
//!                 │         Closed          │
//!                 └─────────────────────────┘
//! ```
//!
//! `Closed` is terminal. Reconnecting means constructing a new session.
//!
//! # Submission Phase
//!
//! ```text
//! Idle ──bid sent──> InFlight ──accepted──> Succeeded ──> Idle
//!                             └─rejected──> Failed ─────> Idle
//! ```
//!
//! Only one bid may be in flight. The channel carries no correlation id, so
//! "the bid in flight" is the only possible target for an outcome frame.
//! Outcomes are published once and the phase immediately returns to `Idle`.
//!
//! Outcome frames that arrive with no bid in flight are still surfaced. If the
//! server ever echoes another bidder's rejection to every listener it will be
//! shown to this user as well; the protocol gives no way to tell them apart.

use std::fmt;

use gavel_proto::{BidRequest, Inbound, Outbound, Price};

use crate::{
    auction::{AuctionId, AuctionSnapshot},
    error::SessionError,
};

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Constructed, `start` not yet called.
    Idle,
    /// Transport opening.
    Connecting,
    /// Transport open; bids may be submitted.
    Live,
    /// Terminal.
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Closed => "closed",
        })
    }
}

/// Outcome tracking for the most recent user-initiated bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// No bid pending.
    Idle,
    /// Bid sent, no answer yet.
    InFlight,
    /// Server accepted the bid.
    Succeeded {
        /// Confirmation text from the server.
        message: String,
    },
    /// Server rejected the bid.
    Failed {
        /// Rejection text from the server.
        reason: String,
    },
}

/// Everything a consumer sees, published on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Connection lifecycle.
    pub phase: SessionPhase,
    /// Most recent bid's progress.
    pub submission: SubmissionPhase,
    /// Latest snapshot, absent until the server sends one.
    pub snapshot: Option<AuctionSnapshot>,
    /// Latest surfaced error.
    pub last_error: Option<SessionError>,
}

/// Actions returned by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Deliver this view to every subscriber.
    Publish(SessionView),

    /// Close the transport.
    Close {
        /// Reason for closing.
        reason: String,
    },
}

/// A validated, encoded bid ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBid {
    /// Proposed amount.
    pub amount: Price,
    /// Encoded frame text.
    pub frame: String,
}

/// Session state machine.
#[derive(Debug, Clone)]
pub struct Session {
    auction_id: AuctionId,
    phase: SessionPhase,
    submission: SubmissionPhase,
    snapshot: Option<AuctionSnapshot>,
    last_error: Option<SessionError>,
}

impl Session {
    /// Create a session for `auction_id` in `Idle`.
    pub fn new(auction_id: AuctionId) -> Self {
        Self {
            auction_id,
            phase: SessionPhase::Idle,
            submission: SubmissionPhase::Idle,
            snapshot: None,
            last_error: None,
        }
    }

    /// Auction this session watches.
    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    /// Current connection phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current submission phase.
    pub fn submission(&self) -> &SubmissionPhase {
        &self.submission
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> Option<&AuctionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Latest surfaced error.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Snapshot of everything a consumer sees.
    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            submission: self.submission.clone(),
            snapshot: self.snapshot.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Transition `Idle → Connecting`.
    ///
    /// The driver opens the transport after this succeeds.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` once the session has closed
    /// - `AlreadyStarted` while connecting or live
    pub fn start(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        match self.phase {
            SessionPhase::Idle => {
                self.phase = SessionPhase::Connecting;
                tracing::info!(auction = %self.auction_id, "connecting");
                Ok(vec![self.publish()])
            },
            SessionPhase::Closed => Err(SessionError::SessionClosed),
            phase => Err(SessionError::AlreadyStarted { phase }),
        }
    }

    /// Transport reported the connection open.
    pub fn handle_open(&mut self) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Connecting {
            tracing::debug!(phase = %self.phase, "ignoring open notification");
            return vec![];
        }

        self.phase = SessionPhase::Live;
        tracing::info!(auction = %self.auction_id, "live");
        vec![self.publish()]
    }

    /// Transport delivered one inbound frame.
    ///
    /// Malformed and unrecognized frames are dropped without any action.
    pub fn handle_message(&mut self, raw: &str) -> Vec<SessionAction> {
        if self.phase != SessionPhase::Live {
            tracing::debug!(phase = %self.phase, "ignoring frame outside live phase");
            return vec![];
        }

        match gavel_proto::decode(raw) {
            Ok(Inbound::Snapshot(update)) => {
                let snapshot = AuctionSnapshot::from_update(self.auction_id.clone(), update);
                tracing::debug!(
                    auction = %self.auction_id,
                    status = %snapshot.status,
                    price = %snapshot.current_price(),
                    "snapshot replaced"
                );
                self.snapshot = Some(snapshot);
                vec![self.publish()]
            },
            Ok(Inbound::BidAccepted { message }) => {
                self.last_error = None;
                self.resolve_submission(SubmissionPhase::Succeeded { message })
            },
            Ok(Inbound::BidRejected { reason }) => {
                self.last_error = Some(SessionError::BidRejected { reason: reason.clone() });
                self.resolve_submission(SubmissionPhase::Failed { reason })
            },
            Ok(Inbound::Unrecognized) => {
                tracing::debug!(frame = raw, "dropping unrecognized frame");
                vec![]
            },
            Err(error) => {
                tracing::debug!(%error, "dropping malformed frame");
                vec![]
            },
        }
    }

    /// Transport reported the connection closed.
    ///
    /// A close before open is a `ConnectionFailed`; a close while live is a
    /// `ConnectionLost`. A bid in flight is abandoned: it never reports
    /// success or failure.
    pub fn handle_close(&mut self, reason: &str) -> Vec<SessionAction> {
        let error = match self.phase {
            SessionPhase::Connecting => {
                SessionError::ConnectionFailed { reason: reason.to_string() }
            },
            SessionPhase::Live => SessionError::ConnectionLost { reason: reason.to_string() },
            SessionPhase::Idle | SessionPhase::Closed => {
                tracing::debug!(phase = %self.phase, "ignoring close notification");
                return vec![];
            },
        };

        if self.submission == SubmissionPhase::InFlight {
            tracing::warn!(auction = %self.auction_id, "bid abandoned by connection close");
        }
        tracing::warn!(auction = %self.auction_id, %error, "session closed");

        self.phase = SessionPhase::Closed;
        self.submission = SubmissionPhase::Idle;
        self.last_error = Some(error);
        vec![self.publish()]
    }

    /// Validate and encode a bid without changing state.
    ///
    /// The amount is checked first, so malformed input is reported as
    /// `InvalidAmount` in every phase.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not a positive decimal
    /// - `NotConnected` unless the session is live
    /// - `SubmissionInProgress` if a bid is already in flight
    pub fn prepare_bid(&self, amount: &str) -> Result<PreparedBid, SessionError> {
        let bid = BidRequest::parse(amount)
            .map_err(|reason| SessionError::InvalidAmount { input: amount.to_string(), reason })?;

        if self.phase != SessionPhase::Live {
            return Err(SessionError::NotConnected { phase: self.phase });
        }
        if self.submission == SubmissionPhase::InFlight {
            return Err(SessionError::SubmissionInProgress);
        }

        let frame = Outbound::from(bid)
            .encode()
            .map_err(|e| SessionError::Encode { reason: e.to_string() })?;

        Ok(PreparedBid { amount: bid.amount(), frame })
    }

    /// Transport accepted a prepared bid; enter `InFlight`.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless live with no bid in flight.
    pub fn bid_sent(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        if self.phase != SessionPhase::Live || self.submission == SubmissionPhase::InFlight {
            return Err(SessionError::InvalidState { phase: self.phase, operation: "send bid" });
        }

        self.submission = SubmissionPhase::InFlight;
        self.last_error = None;
        tracing::debug!(auction = %self.auction_id, "bid in flight");
        Ok(vec![self.publish()])
    }

    /// Tear the session down.
    ///
    /// Publishes nothing: consumers hear nothing after a stop. Idempotent.
    pub fn stop(&mut self) -> Vec<SessionAction> {
        if self.phase == SessionPhase::Closed {
            return vec![];
        }

        tracing::info!(auction = %self.auction_id, phase = %self.phase, "stopping");
        self.phase = SessionPhase::Closed;
        self.submission = SubmissionPhase::Idle;
        vec![SessionAction::Close { reason: "stopped by client".to_string() }]
    }

    fn resolve_submission(&mut self, outcome: SubmissionPhase) -> Vec<SessionAction> {
        if self.submission != SubmissionPhase::InFlight {
            tracing::debug!(auction = %self.auction_id, "bid outcome with no bid in flight");
        }

        self.submission = outcome;
        let surfaced = self.publish();
        self.submission = SubmissionPhase::Idle;
        vec![surfaced, self.publish()]
    }

    fn publish(&self) -> SessionAction {
        SessionAction::Publish(self.view())
    }
}
