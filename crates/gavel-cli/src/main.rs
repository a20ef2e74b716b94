//! `gavel` binary entry point.

use std::process::ExitCode;

use clap::Parser;
use gavel_cli::{Args, CliError, drive, render};
use gavel_client::{LiveSession, WsTransport};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with status lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "gavel exited");
            // Reported even when RUST_LOG silences the subscriber
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{}", render::fatal_line(&error));
            }
            ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args) -> Result<(), CliError> {
    let session = LiveSession::new(
        WsTransport::new(),
        &args.session_config()?,
        args.auction_id()?,
        &args.credential()?,
    )?;
    tracing::info!(auction = %session.auction_id(), "joining auction");

    let input = BufReader::new(tokio::io::stdin());
    drive(&session, input, tokio::io::stdout(), args.connect_timeout()).await
}
