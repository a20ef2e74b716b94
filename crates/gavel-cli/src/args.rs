//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use gavel_client::{AddressError, AuctionId, ChannelRoot, Credential, SessionConfig};

/// Watch one live auction and bid from the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "gavel", version)]
pub struct Args {
    /// Auction to join
    #[arg(short, long)]
    pub auction: String,

    /// Bearer token issued by the auth service
    #[arg(short, long, env = "GAVEL_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Channel root, e.g. ws://localhost:9000/ws/auction
    #[arg(long, env = "GAVEL_WS_URL", conflicts_with = "origin")]
    pub url: Option<String>,

    /// Site origin to derive the channel root from, e.g. https://bids.example.com
    #[arg(long)]
    pub origin: Option<String>,

    /// Force wss even for a plain ws root
    #[arg(long)]
    pub secure: bool,

    /// Seconds to wait for the session to go live
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,
}

impl Args {
    /// Session configuration selected by `--url` or `--origin`.
    pub fn session_config(&self) -> Result<SessionConfig, AddressError> {
        let root = match (&self.url, &self.origin) {
            (Some(url), _) => ChannelRoot::parse(url)?,
            (None, Some(origin)) => ChannelRoot::for_origin(origin)?,
            (None, None) => ChannelRoot::default(),
        };
        Ok(SessionConfig::with_channel_root(root.secured(self.secure)))
    }

    /// Auction identifier.
    pub fn auction_id(&self) -> Result<AuctionId, AddressError> {
        AuctionId::new(self.auction.as_str())
    }

    /// Bearer credential.
    pub fn credential(&self) -> Result<Credential, AddressError> {
        Credential::new(self.token.as_str())
    }

    /// Deadline for going live.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}
