//! Gavel live bidding core logic
//!
//! Pure state machine logic for watching and bidding on one live auction,
//! completely decoupled from I/O and from any async runtime.
//!
//! # Architecture
//!
//! The [`session::Session`] machine consumes transport notifications and user
//! requests one at a time and returns declarative [`session::SessionAction`]s.
//! A driver (the client facade, or a test) executes them. Keeping the machine
//! free of I/O lets the same logic run against a real WebSocket, an in-memory
//! simulated server, or a property-test model.
//!
//! # Components
//!
//! - [`session`]: Session and submission state machine
//! - [`transport`]: Transport abstraction and event delivery contract
//! - [`address`]: Per-auction channel addressing
//! - [`auction`]: Session identity and auction snapshot
//! - [`config`]: Session configuration
//! - [`error`]: Session and addressing errors

pub mod address;
pub mod auction;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use address::ChannelRoot;
pub use auction::{AuctionId, AuctionSnapshot, Credential};
pub use config::SessionConfig;
pub use error::{AddressError, SessionError};
pub use session::{
    PreparedBid, Session, SessionAction, SessionPhase, SessionView, SubmissionPhase,
};
pub use transport::{EventSink, Transport, TransportEvent, TransportLink};
