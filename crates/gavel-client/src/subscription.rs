//! Subscriber side of a session's change stream.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use gavel_core::SessionView;
use tokio::sync::mpsc;

/// Stream of [`SessionView`]s, one per change.
///
/// The first view is the state at the time of subscribing. The stream ends
/// when the session stops, or after the view announcing that the session
/// closed. Once the session is stopped nothing more is yielded, not even
/// views that were queued before the stop.
#[derive(Debug)]
pub struct Subscription {
    views: mpsc::UnboundedReceiver<SessionView>,
    stopped: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        views: mpsc::UnboundedReceiver<SessionView>,
        stopped: Arc<AtomicBool>,
    ) -> Self {
        Self { views, stopped }
    }

    /// Wait for the next view. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<SessionView> {
        if self.is_stopped() {
            return None;
        }
        let view = self.views.recv().await?;
        (!self.is_stopped()).then_some(view)
    }

    /// Next view if one is already queued.
    pub fn try_next(&mut self) -> Option<SessionView> {
        if self.is_stopped() {
            return None;
        }
        self.views.try_recv().ok()
    }

    /// Every view queued right now.
    pub fn drain(&mut self) -> Vec<SessionView> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
