//! Gavel live bidding client
//!
//! Runs the [`gavel_core::Session`] state machine against a transport and
//! hands consumers a stream of views.
//!
//! # Components
//!
//! - [`LiveSession`]: Facade owning one auction's session and connection
//! - [`Subscription`]: Per-consumer stream of [`SessionView`]s
//! - [`WsTransport`]: WebSocket transport (feature `transport`)
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "transport")]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use gavel_client::{AuctionId, Credential, LiveSession, SessionConfig, WsTransport};
//!
//! let session = LiveSession::new(
//!     WsTransport::new(),
//!     &SessionConfig::default(),
//!     AuctionId::new("42")?,
//!     &Credential::new("token")?,
//! )?;
//! let mut views = session.subscribe();
//! session.start()?;
//!
//! while let Some(view) = views.next().await {
//!     if view.phase == gavel_client::SessionPhase::Live {
//!         session.submit_bid("15.00")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod session;
mod subscription;
mod transport;

pub use gavel_core::{
    AddressError, AuctionId, AuctionSnapshot, ChannelRoot, Credential, SessionConfig,
    SessionError, SessionPhase, SessionView, SubmissionPhase, Transport, TransportEvent,
    TransportLink,
};
pub use gavel_proto::{AuctionStatus, LastVote, Price};
pub use session::LiveSession;
pub use subscription::Subscription;
#[cfg(feature = "transport")]
pub use transport::{WsLink, WsTransport};
