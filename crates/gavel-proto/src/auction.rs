//! Auction snapshot body as carried on the wire.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::price::Price;

/// Lifecycle status reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    /// Not yet open for bidding.
    Scheduled,
    /// Open for bidding.
    Started,
    /// Closed; the last vote (if any) won.
    Ended,
}

impl AuctionStatus {
    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Started => "started",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current highest bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastVote {
    /// Bid amount.
    #[serde(rename = "price")]
    pub amount: Price,
    /// Identity (email) of the bidder.
    #[serde(rename = "user")]
    pub bidder: String,
}

/// Full auction representation pushed by the server.
///
/// Every update replaces the previous one wholesale, so all fields are
/// present here even when only the price changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionUpdate {
    /// Display title.
    pub title: String,
    /// Display description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Absolute image URL, if the auction has one.
    #[serde(default)]
    pub image: Option<String>,
    /// Baseline price, fixed at auction creation.
    pub starting_price: Price,
    /// Lifecycle status.
    pub status: AuctionStatus,
    /// Current highest bid; `None` when nobody has bid yet.
    #[serde(default, deserialize_with = "partial_vote")]
    pub last_vote: Option<LastVote>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A vote object with a null price or user counts as no vote.
fn partial_vote<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<LastVote>, D::Error> {
    #[derive(Deserialize)]
    struct RawVote {
        #[serde(default)]
        price: Option<Price>,
        #[serde(default)]
        user: Option<String>,
    }

    let raw = Option::<RawVote>::deserialize(deserializer)?;
    Ok(raw.and_then(|vote| match (vote.price, vote.user) {
        (Some(amount), Some(bidder)) => Some(LastVote { amount, bidder }),
        _ => None,
    }))
}
