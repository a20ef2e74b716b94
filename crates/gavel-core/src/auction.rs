//! Session identity and the client's view of one auction.

use std::{fmt, str::FromStr};

use gavel_proto::{AuctionStatus, AuctionUpdate, LastVote, Price};

use crate::error::AddressError;

/// Opaque auction identifier, fixed for a session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuctionId(String);

impl AuctionId {
    /// Wrap an identifier.
    ///
    /// # Errors
    ///
    /// `EmptyAuctionId` if `id` is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, AddressError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AddressError::EmptyAuctionId);
        }
        Ok(Self(id))
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AuctionId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Bearer token issued by the auth service.
///
/// Treated as an opaque string. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token.
    ///
    /// # Errors
    ///
    /// `EmptyCredential` if `token` is blank.
    pub fn new(token: impl Into<String>) -> Result<Self, AddressError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AddressError::EmptyCredential);
        }
        Ok(Self(token))
    }

    /// Raw token, for embedding in the channel address.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Last authoritative state of an auction as reported by the server.
///
/// Replaced wholesale on every update; no field survives from an earlier
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionSnapshot {
    /// Auction this snapshot belongs to.
    pub auction_id: AuctionId,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Image URL.
    pub image: Option<String>,
    /// Lifecycle status as last reported.
    pub status: AuctionStatus,
    /// Baseline price.
    pub starting_price: Price,
    /// Current highest bid.
    pub last_vote: Option<LastVote>,
}

impl AuctionSnapshot {
    /// Stamp a decoded update with the session's auction id.
    pub fn from_update(auction_id: AuctionId, update: AuctionUpdate) -> Self {
        let AuctionUpdate { title, description, image, starting_price, status, last_vote } =
            update;
        Self { auction_id, title, description, image, status, starting_price, last_vote }
    }

    /// Effective price: the highest bid, or the starting price if nobody has
    /// bid yet.
    pub fn current_price(&self) -> Price {
        self.last_vote.as_ref().map_or(self.starting_price, |vote| vote.amount)
    }

    /// Identity of the current highest bidder.
    pub fn leader(&self) -> Option<&str> {
        self.last_vote.as_ref().map(|vote| vote.bidder.as_str())
    }
}
