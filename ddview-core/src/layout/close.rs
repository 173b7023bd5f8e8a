//! Deferred tab-close checks.
//!
//! Removing a tab does not immediately count as closing it: a tab dragged to
//! another panel is removed and reinserted in quick succession. The layout
//! therefore queues a check, and only once the check is due and the tab is
//! still absent do its close listeners fire.

use std::cell::RefCell;

use tokio::sync::Notify;
use tokio::time::Instant;

use super::types::{PanelData, PanelState};

/// A queued close check, with the layout from before the removal.
pub(crate) struct PendingClose {
    pub tab_id: String,
    pub state: PanelState,
    pub data: PanelData,
    pub due: Instant,
}

#[derive(Default)]
pub(crate) struct CloseQueue {
    pending: RefCell<Vec<PendingClose>>,
    notify: Notify,
}

impl CloseQueue {
    pub fn push(&self, close: PendingClose) {
        self.pending.borrow_mut().push(close);
        self.notify.notify_one();
    }

    /// Remove and return every check due at `now`, oldest first.
    pub fn take_due(&self, now: Instant) -> Vec<PendingClose> {
        let mut pending = self.pending.borrow_mut();
        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
            .into_iter()
            .partition(|close| close.due <= now);
        *pending = rest;
        due
    }

    pub fn take_all(&self) -> Vec<PendingClose> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.borrow().iter().map(|close| close.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Resolves once a check has been queued since the last call.
    pub async fn queued(&self) {
        self.notify.notified().await
    }
}
