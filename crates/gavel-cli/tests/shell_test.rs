//! End-to-end tests for the interactive shell.
//!
//! The shell is driven through in-memory pipes: the test types into one end
//! and reads rendered status lines from the other, while the session talks
//! to the simulated server.

use std::time::Duration;

use gavel_cli::{CliError, drive};
use gavel_client::{
    AuctionId, Credential, LiveSession, Price, SessionConfig, SessionError, SessionPhase,
    Transport, TransportEvent, TransportLink,
};
use gavel_harness::{SimAuction, SimServer, SimTransport};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines},
    sync::mpsc,
};

const ALICE: &str = "alice@example.com";
const TIMEOUT: Duration = Duration::from_secs(5);

type Screen = Lines<BufReader<DuplexStream>>;

fn server() -> SimServer {
    let server = SimServer::new();
    server.add_user("alice-token", ALICE);
    server.add_auction(
        "7",
        SimAuction::new("Lamp", Price::from_minor_units(1000)).with_participant(ALICE),
    );
    server
}

fn session<T: Transport>(transport: T) -> LiveSession<T> {
    LiveSession::new(
        transport,
        &SessionConfig::default(),
        AuctionId::new("7").unwrap(),
        &Credential::new("alice-token").unwrap(),
    )
    .unwrap()
}

fn terminal() -> (DuplexStream, BufReader<DuplexStream>, DuplexStream, Screen) {
    let (keyboard, input) = tokio::io::duplex(1024);
    let (output, screen) = tokio::io::duplex(16 * 1024);
    (keyboard, BufReader::new(input), output, BufReader::new(screen).lines())
}

async fn line_matching(screen: &mut Screen, pattern: &str) -> String {
    loop {
        let line = tokio::time::timeout(TIMEOUT, screen.next_line())
            .await
            .expect("timed out waiting for output")
            .unwrap()
            .expect("output ended");
        if line.contains(pattern) {
            return line;
        }
    }
}

#[tokio::test]
async fn bid_then_quit() {
    let server = server();
    let session = session(server.transport());
    let (mut keyboard, input, output, mut screen) = terminal();

    let script = async move {
        line_matching(&mut screen, "no bids yet").await;
        keyboard.write_all(b"15\n").await.unwrap();
        let accepted = line_matching(&mut screen, "accepted:").await;
        keyboard.write_all(b"/quit\n").await.unwrap();
        accepted
    };
    let (result, accepted) = tokio::join!(drive(&session, input, output, TIMEOUT), script);

    assert!(result.is_ok(), "{result:?}");
    insta::assert_snapshot!(
        accepted,
        @"[live] Lamp (started) | $15.00 by alice@example.com | accepted: Bid of 15.00 placed successfully."
    );
    assert_eq!(session.view().phase, SessionPhase::Closed);
    assert_eq!(server.listeners("7"), 0);
}

#[tokio::test]
async fn local_errors_are_reported_and_session_survives() {
    let server = server();
    let session = session(server.transport());
    let (mut keyboard, input, output, mut screen) = terminal();

    let script = async move {
        line_matching(&mut screen, "no bids yet").await;

        keyboard.write_all(b"abc\n").await.unwrap();
        let invalid = line_matching(&mut screen, "error:").await;

        keyboard.write_all(b"/bid\n").await.unwrap();
        let usage = line_matching(&mut screen, "/bid:").await;

        keyboard.write_all(b"/raise 5\n").await.unwrap();
        let unknown = line_matching(&mut screen, "unknown command").await;

        keyboard.write_all(b"/status\n").await.unwrap();
        let status = line_matching(&mut screen, "[live]").await;

        // End of input stops the session
        drop(keyboard);
        (invalid, usage, unknown, status)
    };
    let (result, (invalid, usage, unknown, status)) =
        tokio::join!(drive(&session, input, output, TIMEOUT), script);

    assert!(result.is_ok(), "{result:?}");
    assert!(invalid.starts_with("error: invalid bid amount 'abc'"), "{invalid}");
    insta::assert_snapshot!(usage, @"/bid: Usage: /bid <amount>");
    assert!(unknown.starts_with("unknown command: /raise 5"), "{unknown}");
    insta::assert_snapshot!(status, @"[live] Lamp (started) | $10.00 starting, no bids yet");
    assert!(server.frames_from(ALICE).is_empty());
}

#[tokio::test]
async fn rejected_bid_is_rendered() {
    let server = server();
    let session = session(server.transport());
    let (mut keyboard, input, output, mut screen) = terminal();

    let script = async move {
        line_matching(&mut screen, "no bids yet").await;
        keyboard.write_all(b"/bid 5\n").await.unwrap();
        let rejected = line_matching(&mut screen, "rejected:").await;
        keyboard.write_all(b"/q\n").await.unwrap();
        rejected
    };
    let (result, rejected) = tokio::join!(drive(&session, input, output, TIMEOUT), script);

    assert!(result.is_ok(), "{result:?}");
    insta::assert_snapshot!(
        rejected,
        @"[live] Lamp (started) | $10.00 starting, no bids yet | rejected: Bid must be higher than the current price of 10.00."
    );
}

#[tokio::test]
async fn connection_loss_ends_the_run() {
    let server = server();
    let session = session(server.transport());
    let (_keyboard, input, output, mut screen) = terminal();

    let script = async {
        line_matching(&mut screen, "no bids yet").await;
        server.drop_all("maintenance");
        line_matching(&mut screen, "[closed]").await
    };
    let (result, closed) = tokio::join!(drive(&session, input, output, TIMEOUT), script);

    assert!(matches!(
        result,
        Err(CliError::Session(SessionError::ConnectionLost { ref reason })) if reason == "maintenance"
    ));
    assert!(closed.ends_with("connection lost: maintenance"), "{closed}");
}

#[tokio::test]
async fn refused_connection_fails_fast() {
    let server = server();
    server.refuse_connections(true);
    let session = session(server.transport());

    let result = drive(&session, tokio::io::empty(), tokio::io::sink(), TIMEOUT).await;

    assert!(matches!(result, Err(CliError::Session(SessionError::ConnectionFailed { .. }))));
}

/// Transport whose connections never open.
struct Blackhole;

struct BlackholeLink {
    _events: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport for Blackhole {
    type Link = BlackholeLink;

    fn open(&self, _: &url::Url) -> (BlackholeLink, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (BlackholeLink { _events: tx }, rx)
    }
}

impl TransportLink for BlackholeLink {
    fn send(&self, _: String) -> bool {
        false
    }

    fn close(&self) {}
}

#[tokio::test]
async fn connect_timeout_stops_the_session() {
    let session = session(Blackhole);

    let result =
        drive(&session, tokio::io::empty(), tokio::io::sink(), Duration::from_millis(50)).await;

    assert!(matches!(result, Err(CliError::ConnectTimeout { .. })));
    assert_eq!(session.view().phase, SessionPhase::Closed);
}
