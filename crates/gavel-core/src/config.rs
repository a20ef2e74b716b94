//! Session configuration.

use url::Url;

use crate::{
    address::ChannelRoot,
    auction::{AuctionId, Credential},
    error::AddressError,
};

/// Configuration shared by every session a client opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Root under which per-auction channels live.
    pub channel_root: ChannelRoot,
}

impl SessionConfig {
    /// Configuration for a specific channel root.
    pub fn with_channel_root(channel_root: ChannelRoot) -> Self {
        Self { channel_root }
    }

    /// Address of the channel for `auction_id`, authenticated by
    /// `credential`.
    pub fn channel_address(
        &self,
        auction_id: &AuctionId,
        credential: &Credential,
    ) -> Result<Url, AddressError> {
        self.channel_root.channel_address(auction_id, credential)
    }
}
