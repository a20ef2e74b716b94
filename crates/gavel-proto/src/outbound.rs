//! Client-to-server frames.

use serde::Serialize;

use crate::{
    errors::{PriceError, Result},
    price::Price,
};

/// A bid amount proposed by the user, validated but not yet sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidRequest {
    amount: Price,
}

impl BidRequest {
    /// Parse user input into a bid.
    ///
    /// # Errors
    ///
    /// Any [`PriceError`] from parsing, or `NotPositive` for zero and
    /// negative amounts.
    pub fn parse(input: &str) -> std::result::Result<Self, PriceError> {
        Self::new(input.parse()?)
    }

    /// Wrap an already-parsed amount.
    pub fn new(amount: Price) -> std::result::Result<Self, PriceError> {
        if amount.is_positive() { Ok(Self { amount }) } else { Err(PriceError::NotPositive) }
    }

    /// Proposed amount.
    pub fn amount(&self) -> Price {
        self.amount
    }
}

/// Frames the client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outbound {
    /// Request to place a bid; the amount travels as a decimal string.
    PlaceBid {
        /// Proposed amount.
        price: Price,
    },
}

impl Outbound {
    /// Encode to the JSON text sent over the channel.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<BidRequest> for Outbound {
    fn from(bid: BidRequest) -> Self {
        Self::PlaceBid { price: bid.amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_bid_frame() {
        let bid = BidRequest::parse("15").unwrap();
        let frame = Outbound::from(bid).encode().unwrap();
        insta::assert_snapshot!(frame, @r#"{"action":"place_bid","price":"15.00"}"#);
    }

    #[test]
    fn fractional_bid_keeps_cents() {
        let frame = Outbound::from(BidRequest::parse("20.5").unwrap()).encode().unwrap();
        insta::assert_snapshot!(frame, @r#"{"action":"place_bid","price":"20.50"}"#);
    }

    #[test]
    fn bids_must_be_positive() {
        assert_eq!(BidRequest::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(BidRequest::parse("-4"), Err(PriceError::NotPositive));
        assert_eq!(BidRequest::parse("0.00"), Err(PriceError::NotPositive));
        assert!(matches!(BidRequest::parse("ten"), Err(PriceError::Malformed { .. })));
    }
}
