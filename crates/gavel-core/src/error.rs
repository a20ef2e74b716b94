//! Session and addressing errors.

use gavel_proto::PriceError;
use thiserror::Error;

use crate::session::SessionPhase;

/// Errors surfaced by a bidding session.
///
/// Only `ConnectionFailed` and `ConnectionLost` end a session. Every other
/// variant is recoverable within the current session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The transport could not be established.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Reason reported by the transport.
        reason: String,
    },

    /// An open connection dropped without the consumer stopping it.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Reason reported by the transport.
        reason: String,
    },

    /// Bid amount is not a positive decimal.
    #[error("invalid bid amount '{input}': {reason}")]
    InvalidAmount {
        /// What the user typed.
        input: String,
        /// Why it was rejected.
        reason: PriceError,
    },

    /// Bids can only be submitted while the session is live.
    #[error("cannot bid while session is {phase}")]
    NotConnected {
        /// Phase at the time of the attempt.
        phase: SessionPhase,
    },

    /// A previous bid is still awaiting the server's answer.
    #[error("a bid is already awaiting a response")]
    SubmissionInProgress,

    /// The server rejected a bid.
    #[error("bid rejected: {reason}")]
    BidRejected {
        /// Flattened rejection text from the server.
        reason: String,
    },

    /// The session has closed; construct a new one to reconnect.
    #[error("session is closed")]
    SessionClosed,

    /// `start` was called on a session that is already connecting or live.
    #[error("session already started ({phase})")]
    AlreadyStarted {
        /// Phase at the time of the call.
        phase: SessionPhase,
    },

    /// `start` was called outside a Tokio runtime; the session is unchanged.
    #[error("no Tokio runtime to drive the session")]
    NoRuntime,

    /// Operation not valid in the current state.
    #[error("cannot {operation} in phase {phase}")]
    InvalidState {
        /// Current phase.
        phase: SessionPhase,
        /// Attempted operation.
        operation: &'static str,
    },

    /// A bid frame could not be encoded.
    #[error("failed to encode bid: {reason}")]
    Encode {
        /// Encoder message.
        reason: String,
    },
}

/// Errors from building channel addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input is not a URL.
    #[error("invalid URL '{input}': {reason}")]
    InvalidUrl {
        /// Rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Only `ws`, `wss`, `http` and `https` roots are supported.
    #[error("unsupported scheme '{scheme}'")]
    UnsupportedScheme {
        /// Rejected scheme.
        scheme: String,
    },

    /// URL has no hierarchical path (e.g. `mailto:`).
    #[error("URL cannot carry a channel path")]
    CannotBeABase,

    /// Auction identifiers must not be blank.
    #[error("auction id is empty")]
    EmptyAuctionId,

    /// Credentials must not be blank.
    #[error("credential is empty")]
    EmptyCredential,
}
