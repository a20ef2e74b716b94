#![no_main]

use gavel_core::{AuctionId, Session, SessionPhase, SubmissionPhase};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut session = Session::new(AuctionId::new("fuzz").unwrap());
    session.start().unwrap();
    session.handle_open();

    // Each NUL-separated chunk is one inbound frame
    for frame in data.split(|byte| *byte == 0) {
        let Ok(raw) = std::str::from_utf8(frame) else {
            continue;
        };
        session.handle_message(raw);

        assert_eq!(session.phase(), SessionPhase::Live);
        assert!(matches!(session.submission(), SubmissionPhase::Idle | SubmissionPhase::InFlight));
    }
});
