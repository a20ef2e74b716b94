//! Terminal client for Gavel
//!
//! A thin line-oriented shell over [`gavel_client::LiveSession`]: every view
//! is printed as one status line and each input line is a command. All
//! session logic lives in the client and core crates.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod commands;
pub mod error;
pub mod render;
pub mod shell;

pub use args::Args;
pub use commands::Command;
pub use error::CliError;
pub use shell::drive;
