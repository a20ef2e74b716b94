//! Property tests for bidding against the simulated server.
//!
//! Random bids from the local user and from a competing bidder are raced
//! through a live session. Whatever the mix, every observed snapshot must
//! have a highest bid no lower than the one before it, and the wire must
//! carry exactly one frame per submission the session accepted.

use std::time::Duration;

use gavel_client::{
    AuctionId, Credential, LiveSession, Price, SessionConfig, SessionView, SubmissionPhase,
    Subscription,
};
use gavel_harness::{SimAuction, SimServer};
use proptest::prelude::*;

const ALICE: &str = "alice@example.com";
const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
enum Bid {
    Mine(u32),
    Rival(u32),
}

fn bid() -> impl Strategy<Value = Bid> {
    prop_oneof![
        3 => (1u32..500).prop_map(Bid::Mine),
        1 => (1u32..500).prop_map(Bid::Rival),
    ]
}

async fn next_view(views: &mut Subscription) -> Result<SessionView, TestCaseError> {
    tokio::time::timeout(TIMEOUT, views.next())
        .await
        .map_err(|_| TestCaseError::fail("timed out waiting for a view"))?
        .ok_or_else(|| TestCaseError::fail("view stream ended"))
}

async fn run(bids: Vec<Bid>) -> Result<(), TestCaseError> {
    let server = SimServer::new();
    server.add_user("alice-token", ALICE);
    server.add_auction(
        "1",
        SimAuction::new("Clock", Price::from_minor_units(1000)).with_participant(ALICE),
    );

    let session = LiveSession::new(
        server.transport(),
        &SessionConfig::default(),
        AuctionId::new("1").map_err(|e| TestCaseError::fail(e.to_string()))?,
        &Credential::new("alice-token").map_err(|e| TestCaseError::fail(e.to_string()))?,
    )
    .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let mut views = session.subscribe();
    session.start().map_err(|e| TestCaseError::fail(e.to_string()))?;
    while next_view(&mut views).await?.snapshot.is_none() {}

    let mut observed = Vec::new();
    let mut submitted = 0usize;

    for bid in bids {
        match bid {
            Bid::Mine(units) => {
                prop_assert!(session.submit_bid(&units.to_string()).is_ok());
                submitted += 1;
                // Settled once the outcome has been published and reset
                let mut resolved = false;
                loop {
                    let view = next_view(&mut views).await?;
                    observed.push(view.clone());
                    if resolved && view.submission == SubmissionPhase::Idle {
                        break;
                    }
                    resolved |= matches!(
                        view.submission,
                        SubmissionPhase::Succeeded { .. } | SubmissionPhase::Failed { .. }
                    );
                }
            },
            Bid::Rival(units) => {
                let amount = Price::from_minor_units(i64::from(units) * 100);
                if server.place_bid("1", "rival@example.com", amount).is_ok() {
                    observed.push(next_view(&mut views).await?);
                }
            },
        }
    }

    let amounts: Vec<Price> = observed
        .iter()
        .filter_map(|view| view.snapshot.as_ref())
        .filter_map(|snapshot| snapshot.last_vote.as_ref().map(|vote| vote.amount))
        .collect();
    prop_assert!(
        amounts.windows(2).all(|pair| pair[0] <= pair[1]),
        "last vote went backwards: {amounts:?}"
    );
    prop_assert_eq!(server.frames_from(ALICE).len(), submitted);

    session.stop();
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn last_vote_never_decreases(bids in proptest::collection::vec(bid(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(run(bids))?;
    }
}
