//! Interactive loop: renders views and feeds typed commands to the session.
//!
//! Input is read only once the session is live, so anything typed while
//! connecting waits in the terminal buffer instead of failing with
//! `NotConnected`.

use std::time::Duration;

use gavel_client::{LiveSession, SessionError, SessionPhase, Transport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    commands::{self, Command, HELP},
    error::CliError,
    render,
};

/// Run `session` until the user quits, input ends, or the session closes.
///
/// If the session is not live within `connect_timeout` it is stopped and
/// `ConnectTimeout` is returned.
///
/// # Errors
///
/// - `ConnectTimeout` if the session never went live
/// - `Session` if the connection failed or was lost
/// - `Io` if reading input or writing output failed
pub async fn drive<T, R, W>(
    session: &LiveSession<T>,
    input: R,
    mut output: W,
    connect_timeout: Duration,
) -> Result<(), CliError>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut views = session.subscribe();
    let mut lines = input.lines();
    session.start()?;

    let deadline = tokio::time::sleep(connect_timeout);
    tokio::pin!(deadline);
    let mut live = false;

    loop {
        tokio::select! {
            biased;

            view = views.next() => {
                let Some(view) = view else {
                    break;
                };
                live |= view.phase == SessionPhase::Live;
                write_line(&mut output, &render::status_line(&view)).await?;

                if view.phase == SessionPhase::Closed {
                    return match view.last_error {
                        Some(
                            error @ (SessionError::ConnectionFailed { .. }
                            | SessionError::ConnectionLost { .. }),
                        ) => Err(error.into()),
                        _ => Ok(()),
                    };
                }
            },

            () = &mut deadline, if !live => {
                tracing::warn!(timeout = ?connect_timeout, "session did not go live in time");
                session.stop();
                return Err(CliError::ConnectTimeout { seconds: connect_timeout.as_secs() });
            },

            line = lines.next_line(), if live => {
                let Some(line) = line? else {
                    tracing::debug!("input closed");
                    session.stop();
                    break;
                };
                if !execute(session, commands::parse(&line), &mut output).await? {
                    session.stop();
                    break;
                }
            },
        }
    }

    output.flush().await?;
    Ok(())
}

/// Run one command. Returns `false` when the user asked to quit.
async fn execute<T, W>(
    session: &LiveSession<T>,
    command: Command,
    output: &mut W,
) -> Result<bool, CliError>
where
    T: Transport,
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Bid { amount } => {
            if let Err(error) = session.submit_bid(&amount) {
                write_line(output, &render::error_line(&error)).await?;
            }
        },
        Command::Status => write_line(output, &render::status_line(&session.view())).await?,
        Command::Help => write_line(output, HELP).await?,
        Command::Quit => return Ok(false),
        Command::Empty => {},
        Command::Unknown { input } => {
            write_line(output, &format!("unknown command: {input} ({HELP})")).await?;
        },
        Command::InvalidArgs { command, error } => {
            write_line(output, &format!("/{command}: {error}")).await?;
        },
    }
    Ok(true)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> std::io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
