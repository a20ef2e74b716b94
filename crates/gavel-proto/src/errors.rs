//! Error types for the bidding wire format.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur while decoding or encoding channel frames.
///
/// None of these are fatal to a session: inbound frames that fail to decode
/// are dropped by the caller.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON.
    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Frame looked like an auction snapshot but its body is invalid.
    #[error("invalid auction snapshot: {reason}")]
    InvalidSnapshot {
        /// What was wrong with the snapshot body.
        reason: String,
    },
}

/// Errors from parsing a [`crate::Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// No digits at all.
    #[error("amount is empty")]
    Empty,

    /// Input contains something other than an optional sign, digits and a
    /// single decimal point.
    #[error("'{input}' is not a decimal amount")]
    Malformed {
        /// The rejected input.
        input: String,
    },

    /// More fractional digits than the currency carries.
    #[error("amount has {digits} fractional digits, at most 2 are allowed")]
    TooPrecise {
        /// Number of fractional digits in the input.
        digits: usize,
    },

    /// Amount does not fit the fixed-point representation.
    #[error("amount is too large")]
    Overflow,

    /// Bids must be strictly positive.
    #[error("amount must be greater than zero")]
    NotPositive,
}
