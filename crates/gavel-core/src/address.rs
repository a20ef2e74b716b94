//! Per-auction channel addresses.
//!
//! Every auction has its own channel under a common root:
//!
//! ```text
//! <root>/<auction id>/?token=<credential>
//! ```
//!
//! The credential travels as a query parameter because a message-oriented
//! channel offers no per-connection headers once the handshake is done.

use std::fmt;

use url::Url;

use crate::{
    auction::{AuctionId, Credential},
    error::AddressError,
};

/// Channel root used when nothing else is configured.
pub const DEFAULT_CHANNEL_ROOT: &str = "ws://localhost:9000/ws/auction";

/// Path of the channel root below a site origin.
pub const CHANNEL_PATH: &str = "/ws/auction";

/// Query parameter carrying the bearer credential.
pub const TOKEN_PARAM: &str = "token";

/// WebSocket URL prefix under which per-auction channels live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRoot(Url);

impl ChannelRoot {
    /// Parse a channel root.
    ///
    /// `http`/`https` roots are accepted and mapped to `ws`/`wss`. Query and
    /// fragment are discarded.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let mut url = Url::parse(input)
            .map_err(|e| AddressError::InvalidUrl {
                input: input.to_string(),
                reason: e.to_string(),
            })?;

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(AddressError::UnsupportedScheme { scheme: other.to_string() }),
        };
        set_scheme(&mut url, scheme)?;

        if url.cannot_be_a_base() {
            return Err(AddressError::CannotBeABase);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// Derive the channel root for a site origin such as
    /// `https://bids.example.com`.
    ///
    /// A secure origin yields a `wss` root.
    pub fn for_origin(origin: &str) -> Result<Self, AddressError> {
        let mut root = Self::parse(origin)?;
        root.0.set_path(CHANNEL_PATH);
        Ok(root)
    }

    /// Upgrade `ws` to `wss` when the surrounding page was loaded securely.
    pub fn secured(mut self, page_secure: bool) -> Self {
        if page_secure && self.0.scheme() == "ws" && set_scheme(&mut self.0, "wss").is_err() {
            tracing::warn!(root = %self.0, "could not upgrade channel root to wss");
        }
        self
    }

    /// True if the root uses `wss`.
    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }

    /// Root URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Build the address of one auction's channel.
    ///
    /// The auction id becomes a single percent-encoded path segment followed
    /// by a trailing slash; the credential is form-encoded into `token`.
    pub fn channel_address(
        &self,
        auction_id: &AuctionId,
        credential: &Credential,
    ) -> Result<Url, AddressError> {
        let mut url = self.0.clone();
        url.path_segments_mut()
            .map_err(|()| AddressError::CannotBeABase)?
            .pop_if_empty()
            .push(auction_id.as_str())
            .push("");
        url.query_pairs_mut().append_pair(TOKEN_PARAM, credential.expose());
        Ok(url)
    }
}

impl Default for ChannelRoot {
    fn default() -> Self {
        Self::parse(DEFAULT_CHANNEL_ROOT)
            .unwrap_or_else(|_| unreachable!("default channel root is a valid URL"))
    }
}

impl fmt::Display for ChannelRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn set_scheme(url: &mut Url, scheme: &str) -> Result<(), AddressError> {
    if url.scheme() == scheme {
        return Ok(());
    }
    url.set_scheme(scheme)
        .map_err(|()| AddressError::UnsupportedScheme { scheme: url.scheme().to_string() })
}
