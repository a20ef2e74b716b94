//! Wire format for the Gavel live bidding channel.
//!
//! Each auction has its own message-oriented channel carrying one JSON object
//! per frame. The server pushes full auction snapshots and bid outcomes; the
//! client sends bid requests. This crate only translates between text frames
//! and typed values. It holds no session state and performs no I/O.
//!
//! # Tolerance
//!
//! Decoding never panics. Frames that are not JSON, or that look like a
//! snapshot but carry an invalid body, are reported as [`ProtocolError`]s so
//! the caller can drop them. Objects matching no known shape decode to
//! [`Inbound::Unrecognized`].
//!
//! # Money
//!
//! Amounts are [`Price`] values: two-digit fixed point, serialized as decimal
//! strings so the wire never carries binary floats.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auction;
pub mod errors;
pub mod inbound;
pub mod outbound;
pub mod price;

pub use auction::{AuctionStatus, AuctionUpdate, LastVote};
pub use errors::{PriceError, ProtocolError, Result};
pub use inbound::{Inbound, decode};
pub use outbound::{BidRequest, Outbound};
pub use price::Price;
