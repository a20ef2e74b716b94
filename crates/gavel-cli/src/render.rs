//! One-line rendering of session views.

use gavel_client::{AuctionSnapshot, SessionError, SessionView, SubmissionPhase};

use crate::error::CliError;

/// Render a view as a single status line.
///
/// ```text
/// [live] Lamp (started) | $15.00 by a@b.com | bid pending
/// ```
pub fn status_line(view: &SessionView) -> String {
    let mut line = format!("[{}] ", view.phase);
    match &view.snapshot {
        Some(snapshot) => line.push_str(&auction_summary(snapshot)),
        None => line.push_str("waiting for auction data"),
    }

    match &view.submission {
        SubmissionPhase::Idle => {
            if let Some(error) = &view.last_error {
                line.push_str(" | ");
                line.push_str(&error.to_string());
            }
        },
        SubmissionPhase::InFlight => line.push_str(" | bid pending"),
        SubmissionPhase::Succeeded { message } => {
            line.push_str(" | accepted: ");
            line.push_str(message);
        },
        SubmissionPhase::Failed { reason } => {
            line.push_str(" | rejected: ");
            line.push_str(reason);
        },
    }
    line
}

/// Render a synchronous submission failure.
pub fn error_line(error: &SessionError) -> String {
    format!("error: {error}")
}

/// Render the error that ended the run.
pub fn fatal_line(error: &CliError) -> String {
    format!("gavel: {error}")
}

fn auction_summary(snapshot: &AuctionSnapshot) -> String {
    let price = snapshot.current_price().to_currency_string();
    let standing = match snapshot.leader() {
        Some(leader) => format!("{price} by {leader}"),
        None => format!("{price} starting, no bids yet"),
    };
    format!("{} ({}) | {standing}", snapshot.title, snapshot.status)
}

#[cfg(test)]
mod tests {
    use gavel_client::{AuctionId, AuctionStatus, LastVote, Price, SessionPhase};

    use super::*;

    fn view(snapshot: Option<AuctionSnapshot>, submission: SubmissionPhase) -> SessionView {
        SessionView { phase: SessionPhase::Live, submission, snapshot, last_error: None }
    }

    fn lamp(last_vote: Option<LastVote>) -> AuctionSnapshot {
        AuctionSnapshot {
            auction_id: AuctionId::new("7").unwrap(),
            title: "Lamp".into(),
            description: String::new(),
            image: None,
            status: AuctionStatus::Started,
            starting_price: Price::from_minor_units(1000),
            last_vote,
        }
    }

    fn vote(minor: i64) -> Option<LastVote> {
        Some(LastVote { amount: Price::from_minor_units(minor), bidder: "a@b.com".into() })
    }

    #[test]
    fn renders_waiting_state() {
        let mut connecting = view(None, SubmissionPhase::Idle);
        connecting.phase = SessionPhase::Connecting;
        insta::assert_snapshot!(status_line(&connecting), @"[connecting] waiting for auction data");
    }

    #[test]
    fn renders_auction_without_bids() {
        let line = status_line(&view(Some(lamp(None)), SubmissionPhase::Idle));
        insta::assert_snapshot!(line, @"[live] Lamp (started) | $10.00 starting, no bids yet");
    }

    #[test]
    fn renders_leader_with_grouped_price() {
        let line = status_line(&view(Some(lamp(vote(123_450))), SubmissionPhase::InFlight));
        insta::assert_snapshot!(line, @"[live] Lamp (started) | $1,234.50 by a@b.com | bid pending");
    }

    #[test]
    fn renders_outcomes() {
        let accepted = view(Some(lamp(vote(1500))), SubmissionPhase::Succeeded {
            message: "Bid of 15.00 placed successfully.".into(),
        });
        insta::assert_snapshot!(
            status_line(&accepted),
            @"[live] Lamp (started) | $15.00 by a@b.com | accepted: Bid of 15.00 placed successfully."
        );

        let rejected = view(Some(lamp(None)), SubmissionPhase::Failed { reason: "too low".into() });
        insta::assert_snapshot!(
            status_line(&rejected),
            @"[live] Lamp (started) | $10.00 starting, no bids yet | rejected: too low"
        );
    }

    #[test]
    fn renders_connection_loss() {
        let mut closed = view(Some(lamp(None)), SubmissionPhase::Idle);
        closed.phase = SessionPhase::Closed;
        closed.last_error = Some(SessionError::ConnectionLost { reason: "server restart".into() });
        insta::assert_snapshot!(
            status_line(&closed),
            @"[closed] Lamp (started) | $10.00 starting, no bids yet | connection lost: server restart"
        );
    }

    #[test]
    fn renders_submission_error() {
        let error = SessionError::NotConnected { phase: SessionPhase::Connecting };
        insta::assert_snapshot!(error_line(&error), @"error: cannot bid while session is connecting");
    }

    #[test]
    fn renders_fatal_errors() {
        let timeout = CliError::ConnectTimeout { seconds: 10 };
        insta::assert_snapshot!(fatal_line(&timeout), @"gavel: not connected after 10s");

        let lost = CliError::Session(SessionError::ConnectionLost { reason: "maintenance".into() });
        insta::assert_snapshot!(fatal_line(&lost), @"gavel: connection lost: maintenance");
    }
}
