//! CLI errors.

use gavel_client::{AddressError, SessionError};
use thiserror::Error;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments did not form a usable channel address.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// The session could not start, or ended on a connection error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session did not go live before the connect timeout.
    #[error("not connected after {seconds}s")]
    ConnectTimeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// Terminal I/O failed.
    #[error("terminal I/O: {0}")]
    Io(#[from] std::io::Error),
}
